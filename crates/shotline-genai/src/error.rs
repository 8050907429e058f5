//! Error types for generative collaborators.
//!
//! Remote failures are classified once, at the HTTP boundary, into the
//! variants below. `is_rate_limited` and `is_transient` are the only inputs
//! the retry layer needs; every other variant is terminal.

use serde::Deserialize;
use thiserror::Error;

/// Result type for collaborator calls.
pub type GenAiResult<T> = Result<T, GenAiError>;

/// Errors returned by generative collaborators.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// The service is temporarily unable to take the request.
    #[error("Service unavailable: {message}")]
    Unavailable { status: Option<u16>, message: String },

    #[error("Internal service error: {0}")]
    Internal(String),

    /// Rate limit or quota exhaustion.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Content blocked: {0}")]
    Blocked(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No {0} payload in response")]
    NoPayload(String),

    #[error("Video operation still running after {seconds} seconds")]
    PollTimeout { seconds: u64 },

    /// Terminal failure reported by the service.
    #[error("Generation failed: {0}")]
    Failed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenAiError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn no_payload(kind: impl Into<String>) -> Self {
        Self::NoPayload(kind.into())
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error signals rate limiting or quota exhaustion.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Whether this error is a transient server-side or transport failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Internal(_) | Self::Network(_)
        )
    }

    /// Whether a retry could succeed.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limited() || self.is_transient()
    }

    /// Whether the service answered but the reply had the wrong shape.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse(_) | Self::NoPayload(_))
    }

    /// Classify a non-success HTTP response.
    ///
    /// `body` is the raw response text; a Google RPC error envelope is used
    /// for the message and status when present.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
        let (rpc_status, message) = match envelope {
            Some(ErrorEnvelope { error }) => (error.status, error.message),
            None => (None, body.trim().to_string()),
        };
        let message = if message.is_empty() {
            format!("HTTP {}", status)
        } else {
            message
        };

        match status {
            429 => Self::RateLimited(message),
            500 => Self::Internal(message),
            502..=504 => Self::Unavailable {
                status: Some(status),
                message,
            },
            _ if rpc_status.as_deref() == Some("RESOURCE_EXHAUSTED") => Self::RateLimited(message),
            _ => Self::Api { status, message },
        }
    }

    /// Classify an error payload carried inside a finished long-running
    /// operation (Google RPC `Status`).
    pub fn from_rpc_status(code: i32, status: Option<&str>, message: &str) -> Self {
        let message = message.to_string();
        match (code, status) {
            (8, _) | (_, Some("RESOURCE_EXHAUSTED")) => Self::RateLimited(message),
            (14, _) | (_, Some("UNAVAILABLE")) => Self::Unavailable {
                status: None,
                message,
            },
            (13, _) | (_, Some("INTERNAL")) => Self::Internal(message),
            _ => Self::classify_message(&message),
        }
    }

    /// Classify an opaque failure message.
    ///
    /// Used when a service reports errors as free text only. Anything that
    /// does not name a known transient condition is terminal.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        let has_code = |code: &str| {
            lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| token == code)
        };

        if has_code("429")
            || lower.contains("resource_exhausted")
            || lower.contains("resource exhausted")
            || lower.contains("quota")
            || lower.contains("rate limit")
            || lower.contains("too many requests")
        {
            Self::RateLimited(message.to_string())
        } else if has_code("503")
            || has_code("502")
            || has_code("504")
            || lower.contains("unavailable")
            || lower.contains("overloaded")
        {
            Self::Unavailable {
                status: None,
                message: message.to_string(),
            }
        } else if has_code("500") || lower.contains("internal") {
            Self::Internal(message.to_string())
        } else {
            Self::Failed(message.to_string())
        }
    }
}

impl From<reqwest::Error> for GenAiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::MalformedResponse(e.to_string());
        }
        if let Some(status) = e.status() {
            return Self::from_http_status(status.as_u16(), &e.to_string());
        }
        Self::Network(e.to_string())
    }
}

impl From<serde_json::Error> for GenAiError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: RpcStatus,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        assert!(GenAiError::from_http_status(429, "").is_rate_limited());
        assert!(GenAiError::from_http_status(503, "overloaded").is_transient());
        assert!(GenAiError::from_http_status(500, "").is_transient());
        assert!(!GenAiError::from_http_status(400, "bad prompt").is_retryable());
        assert!(!GenAiError::from_http_status(403, "").is_retryable());
    }

    #[test]
    fn test_http_status_reads_rpc_envelope() {
        let body = r#"{"error":{"code":400,"message":"Quota hit","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = GenAiError::from_http_status(400, body);
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "Rate limited: Quota hit");

        let body = r#"{"error":{"code":400,"message":"Invalid aspect ratio","status":"INVALID_ARGUMENT"}}"#;
        match GenAiError::from_http_status(400, body) {
            GenAiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid aspect ratio");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rpc_status_classification() {
        assert!(GenAiError::from_rpc_status(8, None, "x").is_rate_limited());
        assert!(GenAiError::from_rpc_status(14, None, "x").is_transient());
        assert!(GenAiError::from_rpc_status(0, Some("INTERNAL"), "x").is_transient());
        assert!(matches!(
            GenAiError::from_rpc_status(3, Some("INVALID_ARGUMENT"), "bad image"),
            GenAiError::Failed(_)
        ));
    }

    #[test]
    fn test_message_classification() {
        assert!(GenAiError::classify_message("quota exceeded").is_rate_limited());
        assert!(GenAiError::classify_message("HTTP 429 Too Many Requests").is_rate_limited());
        assert!(GenAiError::classify_message("The model is overloaded").is_transient());
        assert!(GenAiError::classify_message("error 503").is_transient());
        assert!(GenAiError::classify_message("500 internal").is_transient());
        // Numbers inside larger tokens are not status codes.
        assert!(!GenAiError::classify_message("waited 5000ms").is_retryable());
        assert!(!GenAiError::classify_message("prompt rejected").is_retryable());
    }

    #[test]
    fn test_malformed_is_terminal() {
        let err: GenAiError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, GenAiError::MalformedResponse(_)));
        assert!(err.is_malformed());
        assert!(!err.is_retryable());
        assert!(GenAiError::no_payload("image").is_malformed());
        assert!(!GenAiError::Failed("x".into()).is_malformed());
    }
}
