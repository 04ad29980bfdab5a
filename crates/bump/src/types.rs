use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Parameters for a single connect attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    pub api_key: String,
    pub username: Option<String>,
    pub message: Option<String>,
}

impl ConnectParams {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            username: None,
            message: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Pairs an asynchronous connect request with the notifications it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of the connection bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeState {
    Idle,
    Connecting,
    Connected,
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeState::Idle => write!(f, "Idle"),
            BridgeState::Connecting => write!(f, "Connecting"),
            BridgeState::Connected => write!(f, "Connected"),
        }
    }
}

/// Why the external connector could not establish a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    UserCanceled,
    NetworkUnavailable,
    InvalidAuthorization,
    Other(String),
}

impl FailReason {
    pub fn is_user_cancel(&self) -> bool {
        matches!(self, FailReason::UserCanceled)
    }
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailReason::UserCanceled => write!(f, "FAIL_USER_CANCELED"),
            FailReason::NetworkUnavailable => write!(f, "FAIL_NETWORK_UNAVAILABLE"),
            FailReason::InvalidAuthorization => write!(f, "FAIL_INVALID_AUTHORIZATION"),
            FailReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Disconnect reason reported by the remote side of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerDisconnect {
    OtherUserQuit,
    OtherUserLost,
    Other(String),
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    LocalUserQuit,
    RemoteUserQuit,
    RemoteUserLost,
    ConnectFailed(FailReason),
    Unknown,
}

impl From<PeerDisconnect> for DisconnectReason {
    fn from(reason: PeerDisconnect) -> Self {
        match reason {
            PeerDisconnect::OtherUserQuit => DisconnectReason::RemoteUserQuit,
            PeerDisconnect::OtherUserLost => DisconnectReason::RemoteUserLost,
            PeerDisconnect::Other(_) => DisconnectReason::Unknown,
        }
    }
}

impl From<FailReason> for DisconnectReason {
    fn from(reason: FailReason) -> Self {
        DisconnectReason::ConnectFailed(reason)
    }
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::LocalUserQuit => write!(f, "END_USER_QUIT"),
            DisconnectReason::RemoteUserQuit => write!(f, "END_OTHER_USER_QUIT"),
            DisconnectReason::RemoteUserLost => write!(f, "END_OTHER_USER_LOST"),
            DisconnectReason::ConnectFailed(reason) => write!(f, "{}", reason),
            DisconnectReason::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Events delivered to the application, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutwardEvent {
    /// The connect attempt was dispatched. Not a connection signal.
    Ready,
    Connected { peer_username: String },
    Data { payload: String },
    Error { message: String },
    Cancel { message: String },
    Disconnected { reason: DisconnectReason },
}

impl OutwardEvent {
    /// Event name understood by scripting hosts
    pub fn name(&self) -> &'static str {
        match self {
            OutwardEvent::Ready => "ready",
            OutwardEvent::Connected { .. } => "connected",
            OutwardEvent::Data { .. } => "data",
            OutwardEvent::Error { .. } => "error",
            OutwardEvent::Cancel { .. } => "cancel",
            OutwardEvent::Disconnected { .. } => "disconnected",
        }
    }

    /// Event payload keyed the way scripting hosts expect
    pub fn payload(&self) -> serde_json::Value {
        match self {
            OutwardEvent::Ready => json!({}),
            OutwardEvent::Connected { peer_username } => json!({ "username": peer_username }),
            OutwardEvent::Data { payload } => json!({ "data": payload }),
            OutwardEvent::Error { message } => json!({ "message": message }),
            OutwardEvent::Cancel { message } => json!({ "message": message }),
            OutwardEvent::Disconnected { reason } => json!({ "message": reason.to_string() }),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        OutwardEvent::Error {
            message: message.into(),
        }
    }
}
