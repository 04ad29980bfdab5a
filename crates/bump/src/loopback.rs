// In-process connector that plays the remote peer.
// Used by tests and the bump-loopback binary in place of a real pairing library.

use crate::{
    BumpError, ConnectOutcome, ConnectParams, ConnectedPeer, CorrelationToken, ExternalConnector,
    FailReason, NotificationSender, PeerDisconnect, PeerTransport, Result,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// How the loopback peer answers a connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopbackMode {
    /// Deliver a successful result straight from `begin_connect`
    Accept,
    /// Hold the result until `LoopbackPeer::accept` or `reject`
    Defer,
    Fail(FailReason),
    Malformed(String),
    /// Refuse to launch the attempt at all
    Unreachable(String),
}

#[derive(Debug, Default)]
struct PeerState {
    link: Option<(CorrelationToken, NotificationSender)>,
    deferred: Option<(CorrelationToken, NotificationSender)>,
    params: Option<ConnectParams>,
    sent: Vec<Vec<u8>>,
    attempts: usize,
}

/// The remote side of a loopback connection
#[derive(Debug, Clone)]
pub struct LoopbackPeer {
    peer_username: String,
    echo: bool,
    fail_sends: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    state: Arc<Mutex<PeerState>>,
}

impl LoopbackPeer {
    fn new(peer_username: String) -> Self {
        Self {
            peer_username,
            echo: false,
            fail_sends: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(PeerState::default())),
        }
    }

    fn transport(&self, token: CorrelationToken) -> Box<dyn PeerTransport> {
        self.closed.store(false, Ordering::SeqCst);
        Box::new(LoopbackTransport {
            token,
            open: AtomicBool::new(true),
            peer: self.clone(),
        })
    }

    fn connected(&self, token: CorrelationToken) -> ConnectOutcome {
        ConnectOutcome::Connected(ConnectedPeer {
            peer_username: self.peer_username.clone(),
            transport: self.transport(token),
        })
    }

    /// Release a deferred attempt as a successful connection
    pub async fn accept(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let (token, notifier) = state
            .deferred
            .take()
            .ok_or_else(|| BumpError::TransportError("no deferred attempt".to_string()))?;

        notifier.connect_result(token, self.connected(token))?;
        state.link = Some((token, notifier));
        Ok(())
    }

    /// Release a deferred attempt as a failure
    pub async fn reject(&self, reason: FailReason) -> Result<()> {
        let (token, notifier) = self
            .state
            .lock()
            .await
            .deferred
            .take()
            .ok_or_else(|| BumpError::TransportError("no deferred attempt".to_string()))?;

        notifier.connect_result(token, ConnectOutcome::Failed(reason))
    }

    /// Deliver raw bytes as if the peer sent them
    pub async fn deliver(&self, chunk: impl Into<Vec<u8>>) -> Result<()> {
        let state = self.state.lock().await;
        let (token, notifier) = state.link.as_ref().ok_or(BumpError::NotConnected)?;
        notifier.data_received(*token, chunk.into())
    }

    /// End the connection from the peer's side
    pub async fn hang_up(&self, reason: PeerDisconnect) -> Result<()> {
        let (token, notifier) = self
            .state
            .lock()
            .await
            .link
            .take()
            .ok_or(BumpError::NotConnected)?;

        info!("Loopback peer {} hanging up", self.peer_username);
        notifier.remote_disconnect(token, reason)
    }

    pub async fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().await.sent.clone()
    }

    pub async fn last_params(&self) -> Option<ConnectParams> {
        self.state.lock().await.params.clone()
    }

    pub async fn attempts(&self) -> usize {
        self.state.lock().await.attempts
    }

    /// Check if the local side closed the transport
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct LoopbackTransport {
    token: CorrelationToken,
    open: AtomicBool,
    peer: LoopbackPeer,
}

#[async_trait]
impl PeerTransport for LoopbackTransport {
    async fn send(&self, chunk: &[u8]) -> Result<()> {
        if self.peer.fail_sends.load(Ordering::SeqCst) {
            return Err(BumpError::TransportError("loopback send failed".to_string()));
        }

        let mut state = self.peer.state.lock().await;
        state.sent.push(chunk.to_vec());

        if self.peer.echo {
            if let Some((token, notifier)) = state.link.as_ref().filter(|(t, _)| *t == self.token) {
                notifier.data_received(*token, chunk.to_vec())?;
            }
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        debug!("Loopback transport {} closed", self.token);
        self.open.store(false, Ordering::SeqCst);
        self.peer.closed.store(true, Ordering::SeqCst);

        let mut state = self.peer.state.lock().await;
        if state.link.as_ref().map_or(false, |(t, _)| *t == self.token) {
            state.link = None;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

pub struct LoopbackConnector {
    mode: LoopbackMode,
    peer: LoopbackPeer,
}

impl LoopbackConnector {
    /// Create a connector whose peer accepts immediately
    pub fn new(peer_username: impl Into<String>) -> Self {
        Self {
            mode: LoopbackMode::Accept,
            peer: LoopbackPeer::new(peer_username.into()),
        }
    }

    pub fn with_mode(mut self, mode: LoopbackMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reflect every sent chunk back as received data
    pub fn with_echo(mut self) -> Self {
        self.peer.echo = true;
        self
    }

    pub fn peer(&self) -> LoopbackPeer {
        self.peer.clone()
    }
}

#[async_trait]
impl ExternalConnector for LoopbackConnector {
    async fn begin_connect(
        &self,
        params: &ConnectParams,
        token: CorrelationToken,
        notifier: NotificationSender,
    ) -> Result<()> {
        let mut state = self.peer.state.lock().await;
        state.attempts += 1;
        state.params = Some(params.clone());

        debug!("Loopback attempt {} in mode {:?}", token, self.mode);

        match &self.mode {
            LoopbackMode::Unreachable(details) => Err(BumpError::TransportError(details.clone())),
            LoopbackMode::Accept => {
                notifier.connect_result(token, self.peer.connected(token))?;
                state.link = Some((token, notifier));
                Ok(())
            }
            LoopbackMode::Defer => {
                state.deferred = Some((token, notifier));
                Ok(())
            }
            LoopbackMode::Fail(reason) => notifier.connect_result(token, ConnectOutcome::Failed(reason.clone())),
            LoopbackMode::Malformed(details) => {
                notifier.connect_result(token, ConnectOutcome::Malformed(details.clone()))
            }
        }
    }

    fn connector_name(&self) -> &str {
        "Loopback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NotificationKind;

    #[tokio::test]
    async fn test_accept_delivers_connected_result() {
        let connector = LoopbackConnector::new("alice");
        let (notifier, mut rx) = NotificationSender::channel();
        let token = CorrelationToken::new();

        connector
            .begin_connect(&ConnectParams::new("key"), token, notifier)
            .await
            .unwrap();

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.token, token);
        match notification.kind {
            NotificationKind::ConnectResult(ConnectOutcome::Connected(peer)) => {
                assert_eq!(peer.peer_username, "alice");
                assert!(peer.transport.is_open());
            }
            other => panic!("unexpected notification: {:?}", other),
        }
        assert_eq!(connector.peer().attempts().await, 1);
    }

    #[tokio::test]
    async fn test_unreachable_refuses_launch() {
        let connector = LoopbackConnector::new("alice")
            .with_mode(LoopbackMode::Unreachable("no radio".to_string()));
        let (notifier, mut rx) = NotificationSender::channel();

        let result = connector
            .begin_connect(&ConnectParams::new("key"), CorrelationToken::new(), notifier)
            .await;

        assert_eq!(result, Err(BumpError::TransportError("no radio".to_string())));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deferred_accept() {
        let connector = LoopbackConnector::new("bob").with_mode(LoopbackMode::Defer);
        let peer = connector.peer();
        let (notifier, mut rx) = NotificationSender::channel();

        connector
            .begin_connect(&ConnectParams::new("key"), CorrelationToken::new(), notifier)
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        peer.accept().await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap().kind,
            NotificationKind::ConnectResult(ConnectOutcome::Connected(_))
        ));

        // Nothing left to release
        assert!(peer.accept().await.is_err());
    }

    #[tokio::test]
    async fn test_deliver_without_link_fails() {
        let connector = LoopbackConnector::new("alice");

        let result = connector.peer().deliver(b"hi".to_vec()).await;
        assert_eq!(result, Err(BumpError::NotConnected));
    }
}
