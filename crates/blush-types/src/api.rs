use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{EngageStatus, RoomState};

// -- Errors --

/// Error body returned by the backend. `detail` is usually a string but
/// validation failures carry a list of field errors instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Human-readable text: `detail` if present, then `message`.
    pub fn text(&self) -> Option<String> {
        match &self.detail {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
        self.message.clone()
    }
}

// -- Auth --

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub is_new_user: bool,
}

// -- Users --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Gold,
    Silver,
    #[serde(other)]
    Bronze,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStrength {
    pub completion_percent: u32,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    pub tier: Tier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kids: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub question: String,
    pub answer: String,
}

/// `GET /api/users/me` payload, also used for discovery cards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    pub phone_number: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub profile_completion: u32,
    #[serde(default)]
    pub profile_strength: Option<ProfileStrength>,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub birth_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dating_mode: Option<String>,
    #[serde(default)]
    pub dating_preference: Option<String>,
    #[serde(default)]
    pub intentions: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub work: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub hometown: Option<String>,
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub habits: Option<Habits>,
    #[serde(default)]
    pub kids_have: Option<String>,
    #[serde(default)]
    pub kids_want: Option<String>,
    #[serde(default)]
    pub star_sign: Option<String>,
    #[serde(default)]
    pub politics: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,

    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub causes: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub prompts: Option<Vec<Prompt>>,

    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whole years between `birth_date` and `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?.date_naive();
        today.years_since(birth)
    }
}

/// `PATCH /api/users/me` body. Keys are camelCase on the wire and habits are
/// sent flat; absent fields are left untouched server-side. The server
/// recomputes `onboarding_completed` after every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_gender: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dating_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kids_have: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kids_want: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star_sign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drinking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub politics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<Prompt>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<Option<String>>>,
}

// -- Chat Night --

/// `GET /api/chat-night/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatNightStatusResponse {
    #[serde(default)]
    pub is_open: bool,
    /// `open`, `closed` or `gated`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub next_start: Option<String>,
    #[serde(default)]
    pub passes_remaining_today: Option<i64>,
    #[serde(default)]
    pub passes_remaining: Option<i64>,
    #[serde(default)]
    pub seconds_until_open: Option<i64>,
    #[serde(default)]
    pub seconds_until_close: Option<i64>,
    #[serde(default)]
    pub min_completion: Option<u32>,
    #[serde(default)]
    pub user_completion: Option<u32>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub active_room_id: Option<String>,
    #[serde(default)]
    pub queue_status: Option<String>,
}

impl ChatNightStatusResponse {
    /// Passes left tonight: the per-day field wins over the legacy total.
    pub fn passes_left(&self) -> i64 {
        self.passes_remaining_today
            .or(self.passes_remaining)
            .unwrap_or(0)
    }

    pub fn is_gated(&self) -> bool {
        self.status.as_deref() == Some("gated")
    }
}

/// `POST /api/chat-night/enter`.
#[derive(Debug, Clone, Deserialize)]
pub struct EnterPoolResponse {
    /// `match_found`, `queued` or `active_room`.
    pub status: String,
    #[serde(default)]
    pub room_id: Option<String>,
}

/// `GET /api/chat-night/my-room`. `state` is `none` while still queued.
#[derive(Debug, Clone, Deserialize)]
pub struct MyRoomResponse {
    pub state: RoomState,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub remaining_seconds: Option<i64>,
    #[serde(default)]
    pub partner_user_id: Option<String>,
}

/// `GET /api/chat-night/room/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomResponse {
    pub room_id: String,
    pub state: RoomState,
    pub seconds_remaining: i64,
    #[serde(default)]
    pub partner_first_name: Option<String>,
    #[serde(default)]
    pub partner_photo: Option<String>,
    #[serde(default)]
    pub engage_status: EngageStatus,
    #[serde(default)]
    pub match_unlocked: bool,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngageRequest {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub room_state: Option<String>,
}

// -- Chat --

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    #[serde(default, alias = "content")]
    pub text: String,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub messages: Vec<MessageResponse>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerSnippet {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadSnippet {
    pub thread_id: String,
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub partner: PartnerSnippet,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadList {
    #[serde(default)]
    pub threads: Vec<ThreadSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerProfile {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub work: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub politics: Option<String>,
}

/// The partner endpoint wraps the profile in `{partner: ...}`; older
/// deployments return it bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PartnerEnvelope {
    Wrapped { partner: PartnerProfile },
    Bare(PartnerProfile),
}

impl PartnerEnvelope {
    pub fn into_profile(self) -> PartnerProfile {
        match self {
            Self::Wrapped { partner } => partner,
            Self::Bare(profile) => profile,
        }
    }
}

// -- Admin --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetrics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub new_24h: u64,
    #[serde(default)]
    pub dau_24h: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementMetrics {
    #[serde(default)]
    pub chat_night_enters_today: u64,
    #[serde(default)]
    pub matches_total: u64,
    #[serde(default)]
    pub matches_today: u64,
    #[serde(default)]
    pub threads_total: u64,
    #[serde(default)]
    pub messages_total: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsOverview {
    #[serde(default)]
    pub users: UserMetrics,
    #[serde(default)]
    pub engagement: EngagementMetrics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserSummary {
    pub id: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub completion: Option<u32>,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The user list is `{users: [...]}` but older builds returned a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdminUserList {
    Wrapped { users: Vec<AdminUserSummary> },
    Bare(Vec<AdminUserSummary>),
}

impl AdminUserList {
    pub fn into_users(self) -> Vec<AdminUserSummary> {
        match self {
            Self::Wrapped { users } => users,
            Self::Bare(users) => users,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityStats {
    #[serde(default)]
    pub messages_sent_all_time: u64,
    #[serde(default)]
    pub matches_count_all_time: u64,
    #[serde(default)]
    pub chat_night_passes_used_today: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserDetail {
    #[serde(default)]
    pub profile: AdminProfile,
    #[serde(default)]
    pub strength: Option<ProfileStrength>,
    #[serde(default)]
    pub activity_stats: ActivityStats,
    #[serde(default)]
    pub matches_recent: Vec<Value>,
    #[serde(default)]
    pub threads_recent: Vec<Value>,
    #[serde(default)]
    pub events_timeline: Vec<Value>,
    #[serde(default)]
    pub passes_history: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BanRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPassesRequest {
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPassesResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub new_passes: Option<u32>,
}

/// `GET /api/admin/toggles`. Root-level keys are kept in `root` for
/// deployments that return settings flat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TogglesResponse {
    #[serde(default)]
    pub env_defaults: BTreeMap<String, Value>,
    #[serde(default)]
    pub dynamic_overrides: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub root: BTreeMap<String, Value>,
}

/// `POST /api/admin/toggles`. The backend stores values as strings.
#[derive(Debug, Clone, Serialize)]
pub struct SetToggleRequest {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"Account already exists","message":"x"}"#).unwrap();
        assert_eq!(body.text().as_deref(), Some("Account already exists"));

        let body: ErrorBody = serde_json::from_str(r#"{"message":"Banned user"}"#).unwrap();
        assert_eq!(body.text().as_deref(), Some("Banned user"));

        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["body","text"],"msg":"field required"}]}"#)
                .unwrap();
        assert!(body.text().unwrap().contains("field required"));
    }

    #[test]
    fn profile_reads_underscore_id_and_tier() {
        let json = r#"{
            "_id": "65f0c0ffee",
            "phone_number": "5551234567",
            "onboarding_completed": true,
            "profile_completion": 80,
            "profile_strength": {"completion_percent": 80, "missing_fields": ["bio"], "tier": "Silver"},
            "birth_date": "1998-06-15T00:00:00",
            "habits": {"drinking": "Socially", "pets": "cat"},
            "created_at": "2025-01-01T10:00:00Z"
        }"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id.as_deref(), Some("65f0c0ffee"));
        assert_eq!(user.role, Role::User);
        assert_eq!(user.profile_strength.unwrap().tier, Tier::Silver);
        assert_eq!(user.habits.unwrap().drinking.as_deref(), Some("Socially"));

        let today = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.age_on(today), Some(26));
    }

    #[test]
    fn unknown_role_is_a_regular_user() {
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Admin);
        let role: Role = serde_json::from_str(r#""moderator""#).unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn status_passes_fall_back_to_legacy_field() {
        let status: ChatNightStatusResponse =
            serde_json::from_str(r#"{"is_open":true,"passes_remaining":2}"#).unwrap();
        assert_eq!(status.passes_left(), 2);

        let status: ChatNightStatusResponse = serde_json::from_str(
            r#"{"is_open":true,"passes_remaining":2,"passes_remaining_today":1}"#,
        )
        .unwrap();
        assert_eq!(status.passes_left(), 1);

        let status: ChatNightStatusResponse = serde_json::from_str(r#"{"is_open":false}"#).unwrap();
        assert_eq!(status.passes_left(), 0);
    }

    #[test]
    fn room_maps_pending_engage_to_none() {
        let room: RoomResponse = serde_json::from_str(
            r#"{"room_id":"r1","state":"active","seconds_remaining":120,"engage_status":"pending"}"#,
        )
        .unwrap();
        assert_eq!(room.engage_status, EngageStatus::None);
        assert_eq!(room.state, RoomState::Active);
        assert!(!room.match_unlocked);
    }

    #[test]
    fn partner_envelope_accepts_both_shapes() {
        let wrapped: PartnerEnvelope =
            serde_json::from_str(r#"{"partner":{"id":"u2","first_name":"Ria"}}"#).unwrap();
        assert_eq!(wrapped.into_profile().first_name.as_deref(), Some("Ria"));

        let bare: PartnerEnvelope = serde_json::from_str(r#"{"id":"u3","photos":["a.jpg"]}"#).unwrap();
        assert_eq!(bare.into_profile().photos, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn profile_update_is_camel_case_and_sparse() {
        let update = ProfileUpdate {
            first_name: Some("Ria".into()),
            show_gender: Some(false),
            photos: Some(vec![Some("a.jpg".into()), None]),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"firstName": "Ria", "showGender": false, "photos": ["a.jpg", null]})
        );
    }

    #[test]
    fn toggles_keep_root_level_keys() {
        let toggles: TogglesResponse = serde_json::from_str(
            r#"{"env_defaults":{"FORCE_OPEN":false},"dynamic_overrides":{},"PROFILE_MIN_COMPLETION_FOR_CHAT_NIGHT":40}"#,
        )
        .unwrap();
        assert_eq!(
            toggles.root.get("PROFILE_MIN_COMPLETION_FOR_CHAT_NIGHT"),
            Some(&Value::from(40))
        );
        assert!(toggles.dynamic_overrides.is_empty());
    }
}
