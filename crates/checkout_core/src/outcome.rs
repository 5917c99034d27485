use std::fmt;

use serde_json::Value;

pub const SUCCESS_MESSAGE: &str = "Checked out successfully";
pub const CANCELLED_MESSAGE: &str = "Cancelled by user";

const INVALID_REQUEST_MESSAGE: &str = "Invalid request - check user ID and barcode";
const AUTH_MESSAGE: &str = "Authentication error - insufficient permissions";
const NOT_FOUND_MESSAGE: &str = "User or item not found";
const SERVER_MESSAGE: &str = "Server error - please try again later";
const TRANSPORT_MESSAGE: &str = "Network error - check your connection";
const UNKNOWN_MESSAGE: &str = "Error checking out";

/// Failure reported by a remote call. `status` is 0 when no response arrived.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("remote call failed with status {status}: {message}")]
pub struct RemoteError {
    pub status: u16,
    pub message: String,
    pub payload: Option<Value>,
}

impl RemoteError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_transport(&self) -> bool {
        self.status == 0
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// First `errorList.error[].errorMessage` of the payload, if any.
    pub fn server_detail(&self) -> Option<&str> {
        self.payload
            .as_ref()?
            .pointer("/errorList/error/0/errorMessage")?
            .as_str()
            .map(str::trim)
            .filter(|detail| !detail.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    AuthError,
    NotFound,
    ServerError,
    TransportError,
    Cancelled,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::InvalidRequest => write!(f, "invalid request"),
            ErrorCategory::AuthError => write!(f, "insufficient permissions"),
            ErrorCategory::NotFound => write!(f, "user or item not found"),
            ErrorCategory::ServerError => write!(f, "server error"),
            ErrorCategory::TransportError => write!(f, "network error"),
            ErrorCategory::Cancelled => write!(f, "cancelled by user"),
            ErrorCategory::Unknown => write!(f, "unknown error"),
        }
    }
}

/// Terminal result of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error {
        category: ErrorCategory,
        detail: String,
    },
}

impl Outcome {
    pub fn error(category: ErrorCategory, detail: impl Into<String>) -> Self {
        Outcome::Error {
            category,
            detail: detail.into(),
        }
    }

    pub fn cancelled() -> Self {
        Outcome::error(ErrorCategory::Cancelled, CANCELLED_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Outcome::Success => None,
            Outcome::Error { category, .. } => Some(*category),
        }
    }

    /// User-visible message stored on the item.
    pub fn message(&self) -> &str {
        match self {
            Outcome::Success => SUCCESS_MESSAGE,
            Outcome::Error { detail, .. } => detail,
        }
    }
}

/// Maps a terminal remote failure onto the error taxonomy.
pub fn classify(error: &RemoteError) -> Outcome {
    match error.status {
        400 => Outcome::error(
            ErrorCategory::InvalidRequest,
            error.server_detail().unwrap_or(INVALID_REQUEST_MESSAGE),
        ),
        401 | 403 => Outcome::error(ErrorCategory::AuthError, AUTH_MESSAGE),
        404 => Outcome::error(ErrorCategory::NotFound, NOT_FOUND_MESSAGE),
        status if status >= 500 => Outcome::error(ErrorCategory::ServerError, SERVER_MESSAGE),
        0 => Outcome::error(ErrorCategory::TransportError, TRANSPORT_MESSAGE),
        _ => {
            let detail = error
                .server_detail()
                .or_else(|| Some(error.message.trim()).filter(|m| !m.is_empty()))
                .unwrap_or(UNKNOWN_MESSAGE);
            Outcome::error(ErrorCategory::Unknown, detail)
        }
    }
}
