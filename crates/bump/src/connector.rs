// External connector seam and the notification channel it reports through

use crate::{BumpError, ConnectParams, CorrelationToken, FailReason, PeerDisconnect, PeerTransport, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Payload of a successful external connect
#[derive(Debug)]
pub struct ConnectedPeer {
    pub peer_username: String,
    pub transport: Box<dyn PeerTransport>,
}

/// Result of an external connect attempt
#[derive(Debug)]
pub enum ConnectOutcome {
    Connected(ConnectedPeer),
    Failed(FailReason),
    /// The connector produced a result the bridge cannot read
    Malformed(String),
}

/// A lifecycle callback from the external library
#[derive(Debug)]
pub enum NotificationKind {
    ConnectResult(ConnectOutcome),
    DataReceived(Vec<u8>),
    RemoteDisconnect(PeerDisconnect),
}

#[derive(Debug)]
pub struct Notification {
    pub token: CorrelationToken,
    pub kind: NotificationKind,
}

/// Handed to the connector so it can report results, incoming data and
/// remote disconnects for the attempt it was started with.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, token: CorrelationToken, kind: NotificationKind) -> Result<()> {
        self.tx
            .send(Notification { token, kind })
            .map_err(|_| BumpError::TransportError("session is closed".to_string()))
    }

    pub fn connect_result(&self, token: CorrelationToken, outcome: ConnectOutcome) -> Result<()> {
        self.notify(token, NotificationKind::ConnectResult(outcome))
    }

    pub fn data_received(&self, token: CorrelationToken, chunk: Vec<u8>) -> Result<()> {
        self.notify(token, NotificationKind::DataReceived(chunk))
    }

    pub fn remote_disconnect(&self, token: CorrelationToken, reason: PeerDisconnect) -> Result<()> {
        self.notify(token, NotificationKind::RemoteDisconnect(reason))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Trait for the out-of-module mechanism that discovers and connects a peer.
///
/// `begin_connect` only launches the attempt. The outcome arrives later
/// through `notifier` tagged with `token`. Implementations must not wait on
/// the session from inside `begin_connect`.
#[async_trait]
pub trait ExternalConnector: Send + Sync {
    async fn begin_connect(
        &self,
        params: &ConnectParams,
        token: CorrelationToken,
        notifier: NotificationSender,
    ) -> Result<()>;

    /// Get the connector name
    fn connector_name(&self) -> &str;
}
