//! Sign-up and sign-in flows.

use thiserror::Error;
use tracing::{info, warn};

use blush_api::ApiError;
use blush_types::events::Route;

use crate::backend::AccountApi;
use crate::context::Context;
use crate::session::Section;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password must be at least 8 characters.")]
    WeakPassword,

    #[error("Phone number and password are required.")]
    MissingCredentials,

    #[error("No access token returned")]
    MissingToken,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Sign-up numbers are sent as typed, minus spaces and dashes.
pub fn normalize_signup_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Sign-in numbers are reduced to their last ten digits, which drops any
/// country prefix.
pub fn normalize_login_phone(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(10);
    digits[start..].iter().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created { phone: String },
    /// The number is already registered; the caller is sent to sign-in
    AlreadyExists { phone: String },
}

/// Create an account. Either way it ends on the sign-in screen with the
/// number filled in; the account is not signed in here.
pub async fn register<A: AccountApi>(
    api: &A,
    ctx: &Context,
    phone: &str,
    password: &str,
) -> Result<RegisterOutcome, AuthError> {
    let phone = normalize_signup_phone(phone);
    if password.chars().count() < MIN_PASSWORD_LEN {
        ctx.events
            .alert("Weak Password", "Password must be at least 8 characters.");
        return Err(AuthError::WeakPassword);
    }

    match api.register(&phone, password).await {
        Ok(_) => {
            info!("Registered {}", phone);
            ctx.events.navigate(Route::Login {
                prefill_phone: Some(phone.clone()),
            });
            Ok(RegisterOutcome::Created { phone })
        }
        Err(ApiError::Conflict(_)) => {
            info!("Account exists, redirecting to sign-in");
            ctx.events.navigate(Route::Login {
                prefill_phone: Some(phone.clone()),
            });
            Ok(RegisterOutcome::AlreadyExists { phone })
        }
        Err(e) => {
            if !ctx.intercept(&e).await {
                warn!("Registration failed: {}", e);
                match &e {
                    ApiError::Validation(detail) => {
                        let msg = non_empty(detail).unwrap_or("Invalid input.");
                        ctx.events.alert("Registration Failed", msg);
                    }
                    e if e.is_network() => {
                        let msg = format!("Could not connect to server. {}", e);
                        ctx.events.alert("Error", &msg);
                    }
                    e => {
                        let msg = e
                            .detail()
                            .and_then(non_empty)
                            .unwrap_or("Could not create account");
                        ctx.events.alert("Registration Failed", msg);
                    }
                }
            }
            Err(e.into())
        }
    }
}

/// Sign in and install the session. Returns the screen the navigation gate
/// sends the user to next, which is also emitted.
pub async fn login<A: AccountApi>(
    api: &A,
    ctx: &Context,
    phone: &str,
    password: &str,
) -> Result<Option<Route>, AuthError> {
    let phone = normalize_login_phone(phone);
    if phone.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let token = match api.login(&phone, password).await {
        Ok(token) => token,
        Err(e) => {
            ctx.intercept(&e).await;
            warn!("Login failed: {}", e);
            return Err(e.into());
        }
    };
    if token.access_token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    ctx.session.sign_in(api, &token.access_token).await;

    let next = ctx.session.redirect_for(Section::Auth).await;
    if let Some(route) = &next {
        ctx.events.navigate(route.clone());
    }
    Ok(next)
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
