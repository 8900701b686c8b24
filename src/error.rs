//! Error types for agent wallet API calls
//!
//! Every non-success HTTP outcome is classified into one variant so callers
//! can decide retry and recovery policy themselves. The client never retries.

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Body `code` the service uses to flag an overdrawn channel or wallet
pub const INSUFFICIENT_FUNDS_CODE: &str = "INSUFFICIENT_FUNDS";

const MISSING_MASTER_SEED: &str = "master-seed not found";

/// Core error type for agent wallet operations
#[derive(Error, Debug)]
pub enum AgentWalletError {
    /// Resource does not exist (404)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Resource already exists or is in a conflicting state (409)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Too many requests (429)
    #[error("Rate limited (retry after {retry_after:?}): {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// Amount exceeds the remaining wallet or channel balance
    #[error("Insufficient funds: {message}")]
    InsufficientFunds { message: String },

    /// Malformed request rejected by the service (4xx)
    #[error("Validation failed ({status}): {message}")]
    Validation { status: u16, message: String },

    /// Service-side failure (5xx)
    #[error("Server fault ({status}): {message}")]
    ServerFault { status: u16, message: String },

    /// Any other non-success status
    #[error("Unexpected HTTP status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// No response within the configured timeout
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Connection-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Successful response whose body does not match the expected shape
    #[error("Invalid response body for {operation}: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Local amount could not be parsed as a non-negative integer
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wallet stayed pending for every poll
    #[error("Wallet {agent_id} not active after {attempts} attempts")]
    NotActivated { agent_id: String, attempts: u32 },
}

/// JSON error body shape returned by the service
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    code: Option<String>,
    retry_after: Option<u64>,
}

impl AgentWalletError {
    /// Classify a non-success response into a typed error.
    ///
    /// `retry_after_header` is the raw `Retry-After` header value (seconds),
    /// and `body` the raw response text.
    pub fn from_status(status: StatusCode, retry_after_header: Option<&str>, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let message = parsed
            .error
            .or(parsed.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("no response body")
                        .to_string()
                } else {
                    trimmed.to_string()
                }
            });

        let insufficient = parsed.code.as_deref() == Some(INSUFFICIENT_FUNDS_CODE);
        let code = status.as_u16();

        match status {
            StatusCode::NOT_FOUND => Self::NotFound { message },
            StatusCode::CONFLICT => Self::Conflict { message },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after_header
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .or(parsed.retry_after)
                    .map(Duration::from_secs);
                Self::RateLimited {
                    retry_after,
                    message,
                }
            }
            StatusCode::PAYMENT_REQUIRED => Self::InsufficientFunds { message },
            s if s.is_client_error() && insufficient => Self::InsufficientFunds { message },
            s if s.is_client_error() => Self::Validation {
                status: code,
                message,
            },
            s if s.is_server_error() => Self::ServerFault {
                status: code,
                message,
            },
            _ => Self::UnexpectedStatus {
                status: code,
                message,
            },
        }
    }

    /// Map a reqwest failure that produced no HTTP status
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout }
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// HTTP status carried by this error, if the service answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::RateLimited { .. } => Some(429),
            Self::Validation { status, .. }
            | Self::ServerFault { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Diagnostic text provided by the service
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::NotFound { message }
            | Self::Conflict { message }
            | Self::InsufficientFunds { message }
            | Self::RateLimited { message, .. }
            | Self::Validation { message, .. }
            | Self::ServerFault { message, .. }
            | Self::UnexpectedStatus { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Suggested wait before retrying a rate-limited call
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Whether the same call may succeed if the caller retries later.
    ///
    /// Server faults are excluded: they usually need operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Transport(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Service has no master seed configured and cannot derive wallets
    pub fn is_missing_master_seed(&self) -> bool {
        matches!(self, Self::ServerFault { message, .. } if message.contains(MISSING_MASTER_SEED))
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_uses_error_field() {
        let err = AgentWalletError::from_status(
            StatusCode::CONFLICT,
            None,
            r#"{"error":"Wallet already exists: agent-001"}"#,
        );
        assert!(err.is_conflict());
        assert_eq!(err.server_message(), Some("Wallet already exists: agent-001"));
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_rate_limit_prefers_header() {
        let err = AgentWalletError::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some("60"),
            r#"{"error":"slow down","retryAfter":5}"#,
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rate_limit_falls_back_to_body() {
        let err = AgentWalletError::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            None,
            r#"{"error":"slow down","retryAfter":5}"#,
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_redirect_status_is_unexpected() {
        let err = AgentWalletError::from_status(StatusCode::MULTIPLE_CHOICES, None, "");
        match &err {
            AgentWalletError::UnexpectedStatus { status, message } => {
                assert_eq!(*status, 300);
                assert_eq!(message, "Multiple Choices");
            }
            other => panic!("expected unexpected status, got {other:?}"),
        }
        assert_eq!(err.status(), Some(300));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_insufficient_funds_code() {
        let err = AgentWalletError::from_status(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"error":"channel balance too low","code":"INSUFFICIENT_FUNDS"}"#,
        );
        assert!(matches!(err, AgentWalletError::InsufficientFunds { .. }));

        let err = AgentWalletError::from_status(StatusCode::PAYMENT_REQUIRED, None, "");
        assert!(matches!(err, AgentWalletError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_plain_text_body_is_kept() {
        let err = AgentWalletError::from_status(StatusCode::BAD_REQUEST, None, "bad agent id\n");
        match err {
            AgentWalletError::Validation { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad agent id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_uses_reason() {
        let err = AgentWalletError::from_status(StatusCode::SERVICE_UNAVAILABLE, None, "");
        assert_eq!(err.server_message(), Some("Service Unavailable"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_master_seed() {
        let err = AgentWalletError::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            r#"{"error":"master-seed not found"}"#,
        );
        assert!(err.is_missing_master_seed());
        assert!(!err.is_retryable());
    }
}
