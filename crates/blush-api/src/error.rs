use thiserror::Error;

use blush_types::api::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 / 422, carrying the server's `detail` verbatim
    #[error("{0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("too many requests")]
    RateLimited,

    /// 403 whose detail mentions a ban; the session must be dropped
    #[error("account restricted: {0}")]
    Banned(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Classify a non-success response from its status code and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.text())
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            400 | 422 => Self::Validation(detail),
            401 => Self::Unauthorized,
            403 if detail.to_lowercase().contains("banned") => Self::Banned(detail),
            403 => Self::Forbidden(detail),
            404 => Self::NotFound(detail),
            409 => Self::Conflict(detail),
            429 => Self::RateLimited,
            _ => Self::Status {
                status,
                body: detail,
            },
        }
    }

    /// Server-provided explanation, when there is one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Validation(d)
            | Self::Conflict(d)
            | Self::Banned(d)
            | Self::Forbidden(d)
            | Self::NotFound(d) => Some(d),
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Transport or decoding failure, as opposed to an answer from the server.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_detail_is_detected_case_insensitively() {
        let err = ApiError::from_response(403, r#"{"detail":"User is BANNED"}"#);
        assert!(matches!(err, ApiError::Banned(_)));

        let err = ApiError::from_response(403, r#"{"message":"Account banned: spam"}"#);
        assert!(matches!(err, ApiError::Banned(_)));

        let err = ApiError::from_response(403, r#"{"detail":"No passes remaining"}"#);
        assert!(matches!(err, ApiError::Forbidden(ref d) if d == "No passes remaining"));
    }

    #[test]
    fn validation_keeps_detail_verbatim() {
        let err = ApiError::from_response(400, r#"{"detail":"Chat Night is closed"}"#);
        assert_eq!(err.detail(), Some("Chat Night is closed"));
        assert_eq!(err.to_string(), "Chat Night is closed");
    }

    #[test]
    fn non_json_body_is_used_raw() {
        let err = ApiError::from_response(502, "  Bad Gateway \n");
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rate_limit_and_conflict() {
        assert!(matches!(ApiError::from_response(429, ""), ApiError::RateLimited));
        assert!(matches!(
            ApiError::from_response(409, r#"{"detail":"Account already exists"}"#),
            ApiError::Conflict(_)
        ));
        assert!(matches!(ApiError::from_response(401, ""), ApiError::Unauthorized));
    }
}
