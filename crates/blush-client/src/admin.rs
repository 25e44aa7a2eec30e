//! Admin console actions on top of the raw admin endpoints.

use serde_json::Value;
use tracing::{info, warn};

use blush_api::{ApiClient, ApiError};
use blush_types::api::{AdminUserDetail, TogglesResponse};

use crate::context::Context;

pub const MIN_COMPLETION_KEY: &str = "PROFILE_MIN_COMPLETION_FOR_CHAT_NIGHT";
pub const DEFAULT_BAN_REASON: &str = "Admin Action";
pub const DEFAULT_RESET_COUNT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanAction {
    Ban,
    Unban,
}

impl BanAction {
    /// The action the toggle performs for a user in `detail`'s state.
    pub fn for_user(detail: &AdminUserDetail) -> Self {
        if detail.profile.is_banned {
            Self::Unban
        } else {
            Self::Ban
        }
    }
}

/// Current value of a setting: a runtime override wins over the value the
/// server reports at the top level.
pub fn toggle_value(toggles: &TogglesResponse, key: &str) -> Option<String> {
    toggles
        .dynamic_overrides
        .get(key)
        .or_else(|| toggles.root.get(key))
        .map(value_text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Typed pass count; anything unparsable or zero means the default.
pub fn parse_reset_count(input: &str) -> u32 {
    match input.trim().parse::<u32>() {
        Ok(0) | Err(_) => DEFAULT_RESET_COUNT,
        Ok(n) => n,
    }
}

/// Ban or unban depending on the user's current state.
pub async fn toggle_ban(
    api: &ApiClient,
    ctx: &Context,
    user_id: &str,
    detail: &AdminUserDetail,
    reason: Option<&str>,
) -> Result<BanAction, ApiError> {
    let action = BanAction::for_user(detail);
    let result = match action {
        BanAction::Ban => {
            let reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_BAN_REASON);
            api.admin_ban(user_id, reason).await
        }
        BanAction::Unban => api.admin_unban(user_id).await,
    };

    match result {
        Ok(_) => {
            info!("{:?} applied to user {}", action, user_id);
            ctx.events.alert("Success", "Action completed.");
            Ok(action)
        }
        Err(e) => {
            report_failure(ctx, &e).await;
            Err(e)
        }
    }
}

/// Reset a user's Chat Night passes. Returns the count the server reports.
pub async fn reset_passes(
    api: &ApiClient,
    ctx: &Context,
    user_id: &str,
    count: u32,
) -> Result<u32, ApiError> {
    match api.admin_reset_passes(user_id, count).await {
        Ok(resp) => {
            let passes = resp.new_passes.unwrap_or(count);
            info!("Passes for {} set to {}", user_id, passes);
            ctx.events
                .alert("Success", &format!("Passes set to {}", passes));
            Ok(passes)
        }
        Err(e) => {
            report_failure(ctx, &e).await;
            Err(e)
        }
    }
}

pub async fn set_min_completion(
    api: &ApiClient,
    ctx: &Context,
    value: &str,
) -> Result<(), ApiError> {
    match api.admin_set_toggle(MIN_COMPLETION_KEY, value.trim()).await {
        Ok(()) => {
            info!("{} set to {}", MIN_COMPLETION_KEY, value.trim());
            ctx.events.alert("Success", "Configuration updated.");
            Ok(())
        }
        Err(e) => {
            if !ctx.intercept(&e).await {
                warn!("Toggle update failed: {}", e);
                let msg = if e.is_network() {
                    "Network error."
                } else {
                    "Failed to update configuration."
                };
                ctx.events.alert("Error", msg);
            }
            Err(e)
        }
    }
}

async fn report_failure(ctx: &Context, e: &ApiError) {
    if ctx.intercept(e).await {
        return;
    }
    warn!("Admin action failed: {}", e);
    let msg = if e.is_network() {
        "Network error."
    } else {
        "Action failed."
    };
    ctx.events.alert("Error", msg);
}
