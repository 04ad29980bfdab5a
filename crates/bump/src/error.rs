use crate::{CorrelationToken, FailReason};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BumpError {
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    #[error("Not Connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Failed to parse incoming data")]
    DecodeError,

    #[error("Malformed connection payload: {0}")]
    MalformedPayload(String),

    #[error("A connect attempt or connection is already active")]
    SessionBusy,

    #[error("{0}")]
    ConnectFailed(FailReason),
}

impl From<std::string::FromUtf8Error> for BumpError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        BumpError::DecodeError
    }
}

pub type Result<T> = std::result::Result<T, BumpError>;

/// Context for error logging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub session_id: Option<Uuid>,
    pub token: Option<CorrelationToken>,
    pub peer_username: Option<String>,
    pub additional_info: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            session_id: None,
            token: None,
            peer_username: None,
            additional_info: None,
        }
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_token(mut self, token: CorrelationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_peer_username(mut self, peer_username: String) -> Self {
        self.peer_username = Some(peer_username);
        self
    }

    pub fn with_info(mut self, info: String) -> Self {
        self.additional_info = Some(info);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BumpError {
    /// Log error with structured context
    pub fn log_with_context(&self, context: &ErrorContext) {
        error!(
            error = %self,
            error_type = ?self,
            category = %self.category(),
            session_id = ?context.session_id,
            token = ?context.token,
            peer_username = ?context.peer_username,
            additional_info = ?context.additional_info,
            timestamp = %chrono::Utc::now(),
            "Bump session error occurred"
        );
    }

    /// Get error category for log filtering
    pub fn category(&self) -> ErrorCategory {
        match self {
            BumpError::InvalidArgument(_) => ErrorCategory::Validation,
            BumpError::NotConnected => ErrorCategory::Session,
            BumpError::SessionBusy => ErrorCategory::Session,
            BumpError::TransportError(_) => ErrorCategory::Transport,
            BumpError::ConnectFailed(_) => ErrorCategory::Transport,
            BumpError::DecodeError => ErrorCategory::Decode,
            BumpError::MalformedPayload(_) => ErrorCategory::Decode,
        }
    }

    /// Convert into the event the application sees.
    /// A user-cancelled connect is the only error that surfaces as `Cancel`.
    pub fn to_event(&self) -> crate::OutwardEvent {
        match self {
            BumpError::ConnectFailed(reason) if reason.is_user_cancel() => {
                crate::OutwardEvent::Cancel {
                    message: reason.to_string(),
                }
            }
            other => crate::OutwardEvent::error(other.to_string()),
        }
    }
}

/// Error categories for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Session,
    Transport,
    Decode,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Session => write!(f, "session"),
            ErrorCategory::Transport => write!(f, "transport"),
            ErrorCategory::Decode => write!(f, "decode"),
        }
    }
}
