use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

pub const STATUS_VALIDATION: u16 = 400;
pub const STATUS_TIMEOUT: u16 = 408;
/// No HTTP response was received
pub const STATUS_NO_RESPONSE: u16 = 0;

/// Classification of a chat failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Validation,
    Timeout,
    Network,
    Unknown,
    /// Non-success response whose body carried no usable error code
    Http,
    /// Code reported by the server in the error body
    Server(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Network => "NETWORK_ERROR",
            ErrorCode::Unknown => "UNKNOWN_ERROR",
            ErrorCode::Http => "HTTP_ERROR",
            ErrorCode::Server(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A failed chat call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status, or 0 when no response was received
    pub status: u16,
    pub code: ErrorCode,
    #[serde(rename = "correlationId", skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status: u16, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            status,
            code,
            correlation_id: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message, STATUS_VALIDATION, ErrorCode::Validation)
    }

    pub fn timeout(timeout_ms: u128) -> Self {
        Self::new(
            format!("Request timed out after {}ms", timeout_ms),
            STATUS_TIMEOUT,
            ErrorCode::Timeout,
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(message, STATUS_NO_RESPONSE, ErrorCode::Network)
    }

    pub fn unknown(message: impl Into<String>, status: u16) -> Self {
        Self::new(message, status, ErrorCode::Unknown)
    }

    pub fn http_status(status: u16, status_text: &str) -> Self {
        Self::new(
            format!("HTTP {}: {}", status, status_text),
            status,
            ErrorCode::Http,
        )
    }

    pub fn from_server(
        status: u16,
        detail: impl Into<String>,
        code: &str,
        correlation_id: Option<String>,
    ) -> Self {
        Self {
            message: detail.into(),
            status,
            code: ErrorCode::Server(code.to_string()),
            correlation_id,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        if self.correlation_id.is_none() {
            self.correlation_id = correlation_id;
        }
        self
    }

    /// Only local timeouts and transport failures; a code reported by the
    /// server is never retried, even when it reads `TIMEOUT`.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, ErrorCode::Timeout | ErrorCode::Network)
    }

    /// Whether the failure belongs in the conversation as an assistant turn
    pub fn shows_in_conversation(&self) -> bool {
        self.status != STATUS_NO_RESPONSE && self.code.as_str() != "TIMEOUT"
    }
}
