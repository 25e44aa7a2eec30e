use serde::{Deserialize, Serialize};

/// Screens the client core can ask the front end to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Route {
    Welcome,
    Login { prefill_phone: Option<String> },
    OnboardingName,
    Profile,
    Discovery,
    Matches,
    ChatNight,
    TalkRoom { room_id: String },
    Thread { thread_id: String },
}

/// Events emitted by the client core towards the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientEvent {
    /// Replace the current screen
    Navigate(Route),

    /// Show a one-off notice
    Alert { title: String, message: String },

    /// Server answered 429; nothing is retried automatically
    RateLimited,

    /// Session was cleared, either by the user or because the account is banned
    SignedOut { banned: bool },
}

impl ClientEvent {
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Alert {
            title: title.into(),
            message: message.into(),
        }
    }
}
