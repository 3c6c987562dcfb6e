// Directory API client error types
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the directory API, with enough detail for callers
/// to decide between retrying, re-authenticating and reporting.
#[derive(Debug, Error)]
pub enum ClientError {
    // Connection refused, DNS, TLS, request timeout
    #[error("Directory API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    // 401 Unauthorized
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    // Any other non-success response
    #[error("Directory API returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    // Success status but the body did not match the expected shape
    #[error("Malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        ClientError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// HTTP status associated with the failure, when the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Status { status, .. } => Some(status.as_u16()),
            ClientError::Decode { .. } | ClientError::InvalidUrl(_) => None,
        }
    }

    /// Get error code for CLI and log output
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport(e) if e.is_timeout() => "TIMEOUT",
            ClientError::Transport(_) => "TRANSPORT",
            ClientError::Unauthorized(_) => "UNAUTHORIZED",
            ClientError::Status { status, .. } if status.is_server_error() => "SERVER_ERROR",
            ClientError::Status { .. } => "REQUEST_REJECTED",
            ClientError::Decode { .. } => "MALFORMED_RESPONSE",
            ClientError::InvalidUrl(_) => "INVALID_URL",
        }
    }

    /// Whether repeating the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_codes() {
        let err = ClientError::status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.error_code(), "SERVER_ERROR");
        assert_eq!(err.status_code(), Some(500));
        assert!(err.is_transient());

        let err = ClientError::status(StatusCode::BAD_REQUEST, "missing dn");
        assert_eq!(err.error_code(), "REQUEST_REJECTED");
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Directory API returned 400 Bad Request: missing dn");
    }

    #[test]
    fn test_unauthorized_is_not_transient() {
        let err = ClientError::Unauthorized("Token expiré".to_string());
        assert_eq!(err.status_code(), Some(401));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let err = ClientError::decode("/api/check_login_name", "missing field `exists`");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.error_code(), "MALFORMED_RESPONSE");
    }
}
