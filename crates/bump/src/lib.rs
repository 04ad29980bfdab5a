pub mod types;
pub mod error;
pub mod sink;
pub mod transport;
pub mod connector;
pub mod bridge;
pub mod controller;
pub mod lifecycle;
pub mod module;
pub mod loopback;
pub mod config;
pub mod logging;

pub use types::*;
pub use error::{BumpError, Result, ErrorContext, ErrorCategory};
pub use sink::EventSink;
pub use transport::{ConnectionHandle, PeerTransport};
pub use connector::{ConnectOutcome, ConnectedPeer, ExternalConnector, Notification, NotificationKind, NotificationSender};
pub use bridge::ConnectionBridge;
pub use controller::SessionController;
pub use lifecycle::{LifecycleManager, AppState};
pub use module::{BumpModule, ModuleEvent};
pub use loopback::{LoopbackConnector, LoopbackMode, LoopbackPeer};
pub use config::{BumpConfig, LogFormat};
