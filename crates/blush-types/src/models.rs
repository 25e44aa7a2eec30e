use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::MessageResponse;

/// Identifier of a chat message.
///
/// Server ids are opaque strings. Messages sent optimistically carry a
/// synthetic numeric id until the server echo replaces them, so the two
/// kinds can never collide even when a server id happens to be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    Server(String),
    Pending(u64),
}

impl MessageId {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => f.write_str(id),
            Self::Pending(id) => write!(f, "pending-{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub sender_id: Option<String>,
}

impl From<MessageResponse> for ChatMessage {
    fn from(m: MessageResponse) -> Self {
        Self {
            id: MessageId::Server(m.id),
            text: m.text,
            created_at: m.created_at,
            sender_id: Some(m.sender_id),
        }
    }
}

/// Server-side lifecycle of a Chat Night room. `None` is what `my-room`
/// reports while the caller is still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    None,
    Active,
    Engaged,
    Ended,
    #[serde(other)]
    Other,
}

impl RoomState {
    /// A room the caller can be sent into.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Active | Self::Engaged)
    }
}

/// Engagement progress as seen by the caller.
///
/// Ordered so that `max` never moves backwards: `None < WaitingForPartner <
/// MatchUnlocked`. The backend reports `pending` for "nobody engaged yet",
/// which lands on `None` along with null and any value this client doesn't
/// know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngageStatus {
    #[default]
    None,
    WaitingForPartner,
    MatchUnlocked,
}

impl<'de> Deserialize<'de> for EngageStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("waiting_for_partner") => Self::WaitingForPartner,
            Some("match_unlocked") => Self::MatchUnlocked,
            _ => Self::None,
        })
    }
}

/// Chat Night screen phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatNightPhase {
    Loading,
    Closed,
    Open,
    Searching,
    Gated,
}

impl fmt::Display for ChatNightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Searching => "searching",
            Self::Gated => "gated",
        };
        f.write_str(s)
    }
}

/// Why the caller is kept out of Chat Night.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateInfo {
    pub message: String,
    pub missing_fields: Vec<String>,
    pub required: Option<u32>,
    pub current: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engage_status_orders_forward() {
        assert!(EngageStatus::None < EngageStatus::WaitingForPartner);
        assert!(EngageStatus::WaitingForPartner < EngageStatus::MatchUnlocked);
        assert_eq!(
            EngageStatus::MatchUnlocked.max(EngageStatus::WaitingForPartner),
            EngageStatus::MatchUnlocked
        );
    }

    #[test]
    fn unknown_room_state_is_not_joinable() {
        let state: RoomState = serde_json::from_str(r#""paused""#).unwrap();
        assert_eq!(state, RoomState::Other);
        assert!(!state.is_joinable());
        assert!(RoomState::Engaged.is_joinable());
    }

    #[test]
    fn unknown_engage_status_never_moves_backwards() {
        let decode = |s: &str| serde_json::from_str::<EngageStatus>(s).unwrap();
        assert_eq!(decode(r#""accepted""#), EngageStatus::None);
        assert_eq!(decode(r#""pending""#), EngageStatus::None);
        assert_eq!(decode("null"), EngageStatus::None);
        assert_eq!(decode(r#""waiting_for_partner""#), EngageStatus::WaitingForPartner);

        let mut seen = decode(r#""match_unlocked""#);
        for later in [r#""accepted""#, r#""waiting_for_partner""#, r#""pending""#] {
            seen = seen.max(decode(later));
        }
        assert_eq!(seen, EngageStatus::MatchUnlocked);

        let seen = EngageStatus::WaitingForPartner.max(decode(r#""accepted""#));
        assert_eq!(seen, EngageStatus::WaitingForPartner);
    }

    #[test]
    fn pending_and_server_ids_never_collide() {
        let a = MessageId::Server("42".into());
        let b = MessageId::Pending(42);
        assert_ne!(a, b);
        assert!(b.is_pending());
        assert_eq!(b.to_string(), "pending-42");
    }
}
