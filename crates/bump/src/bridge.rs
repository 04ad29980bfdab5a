// Connection Bridge - turns external lifecycle notifications into outward events

use crate::{
    BridgeState, BumpError, ConnectOutcome, ConnectionHandle, CorrelationToken, DisconnectReason,
    ErrorContext, EventSink, Notification, NotificationKind, OutwardEvent, PeerDisconnect, Result,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// State machine over one peer connection.
///
/// Every transition emits its events before returning, so callers that
/// serialize access to the bridge also serialize the event stream.
pub struct ConnectionBridge {
    session_id: Uuid,
    state: BridgeState,
    pending: Option<CorrelationToken>,
    handle: Option<ConnectionHandle>,
    sink: Arc<dyn EventSink>,
}

impl ConnectionBridge {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: BridgeState::Idle,
            pending: None,
            handle: None,
            sink,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn pending_token(&self) -> Option<CorrelationToken> {
        self.pending
    }

    /// Check if a connection handle is live and open
    pub fn is_connected(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| h.is_open())
    }

    pub fn peer_username(&self) -> Option<&str> {
        self.handle.as_ref().map(|h| h.peer_username())
    }

    pub fn emit(&self, event: OutwardEvent) {
        self.sink.emit(event);
    }

    /// Log an error with the session context and surface it as an event
    pub fn report(&self, err: &BumpError) {
        err.log_with_context(&self.error_context());
        self.sink.emit(err.to_event());
    }

    fn error_context(&self) -> ErrorContext {
        let mut context = ErrorContext::new().with_session_id(self.session_id);
        if let Some(token) = self.pending.or_else(|| self.handle.as_ref().map(|h| h.token())) {
            context = context.with_token(token);
        }
        if let Some(peer) = self.peer_username() {
            context = context.with_peer_username(peer.to_string());
        }
        context
    }

    /// Move from Idle to Connecting for the attempt identified by `token`
    pub fn begin_attempt(&mut self, token: CorrelationToken) -> Result<()> {
        if self.state != BridgeState::Idle {
            warn!("Rejecting connect attempt {}: bridge is {}", token, self.state);
            return Err(BumpError::SessionBusy);
        }

        self.state = BridgeState::Connecting;
        self.pending = Some(token);
        debug!("Connect attempt {} pending", token);
        Ok(())
    }

    /// Abandon the pending attempt without emitting anything.
    /// Returns false if `token` is not the pending attempt.
    pub fn abort_attempt(&mut self, token: CorrelationToken) -> bool {
        if self.state != BridgeState::Connecting || self.pending != Some(token) {
            return false;
        }

        self.state = BridgeState::Idle;
        self.pending = None;
        debug!("Connect attempt {} abandoned", token);
        true
    }

    /// Dispatch a notification from the external connector
    pub async fn apply(&mut self, notification: Notification) {
        let Notification { token, kind } = notification;
        match kind {
            NotificationKind::ConnectResult(outcome) => self.on_external_connect_result(token, outcome).await,
            NotificationKind::DataReceived(chunk) => self.on_data_received(token, chunk),
            NotificationKind::RemoteDisconnect(reason) => self.on_remote_disconnect(token, reason),
        }
    }

    pub async fn on_external_connect_result(&mut self, token: CorrelationToken, outcome: ConnectOutcome) {
        if self.state != BridgeState::Connecting || self.pending != Some(token) {
            debug!("Ignoring stale connect result for attempt {}", token);
            if let ConnectOutcome::Connected(peer) = outcome {
                if let Err(e) = peer.transport.disconnect().await {
                    warn!("Failed to close stale connection to {}: {}", peer.peer_username, e);
                }
            }
            return;
        }

        // Never left in Connecting once the result for this attempt is in
        self.state = BridgeState::Idle;

        match outcome {
            ConnectOutcome::Connected(peer) if peer.peer_username.trim().is_empty() => {
                if let Err(e) = peer.transport.disconnect().await {
                    warn!("Failed to close unnamed connection: {}", e);
                }
                self.report(&BumpError::MalformedPayload("missing peer username".to_string()));
            }
            ConnectOutcome::Connected(peer) => {
                info!("Successfully connected to {}", peer.peer_username);
                let handle = ConnectionHandle::new(peer.peer_username, token, peer.transport);
                let peer_username = handle.peer_username().to_string();
                self.handle = Some(handle);
                self.state = BridgeState::Connected;
                self.sink.emit(OutwardEvent::Connected { peer_username });
            }
            ConnectOutcome::Failed(reason) if reason.is_user_cancel() => {
                info!("Connect attempt {} cancelled by user", token);
                self.sink.emit(BumpError::ConnectFailed(reason).to_event());
            }
            ConnectOutcome::Failed(reason) => {
                self.report(&BumpError::ConnectFailed(reason));
            }
            ConnectOutcome::Malformed(details) => {
                self.report(&BumpError::MalformedPayload(details));
            }
        }

        self.pending = None;
    }

    pub fn on_data_received(&mut self, token: CorrelationToken, chunk: Vec<u8>) {
        if !self.owns_connection(token) {
            debug!("Ignoring {} bytes for attempt {} in state {}", chunk.len(), token, self.state);
            return;
        }

        match String::from_utf8(chunk) {
            Ok(payload) => {
                debug!("Received {} bytes from peer", payload.len());
                self.sink.emit(OutwardEvent::Data { payload });
            }
            Err(e) => self.report(&BumpError::from(e)),
        }
    }

    pub fn on_remote_disconnect(&mut self, token: CorrelationToken, reason: PeerDisconnect) {
        if !self.owns_connection(token) {
            debug!("Ignoring remote disconnect for attempt {} in state {}", token, self.state);
            return;
        }

        let reason = DisconnectReason::from(reason);
        if let Some(mut handle) = self.handle.take() {
            handle.mark_closed();
            info!("Connection to {} ended remotely ({})", handle.peer_username(), reason);
        }
        self.state = BridgeState::Idle;
        self.sink.emit(OutwardEvent::Disconnected { reason });
    }

    /// Tear down the session from this side.
    ///
    /// Connected: closes the transport and emits `Disconnected{LocalUserQuit}`.
    /// Connecting: abandons the attempt silently. Idle: no-op.
    /// Returns true if a `Disconnected` event was emitted.
    pub async fn local_disconnect(&mut self) -> bool {
        match self.state {
            BridgeState::Idle => false,
            BridgeState::Connecting => {
                if let Some(token) = self.pending {
                    self.abort_attempt(token);
                }
                false
            }
            BridgeState::Connected => {
                let Some(mut handle) = self.handle.take() else {
                    self.state = BridgeState::Idle;
                    return false;
                };

                if let Err(e) = handle.close().await {
                    warn!("Transport close failed for {}: {}", handle.peer_username(), e);
                    self.report(&e);
                }
                self.state = BridgeState::Idle;
                self.sink.emit(OutwardEvent::Disconnected {
                    reason: DisconnectReason::LocalUserQuit,
                });
                true
            }
        }
    }

    /// Forward bytes to the live connection, reporting failures as events
    pub async fn send(&self, chunk: &[u8]) {
        let Some(handle) = self.handle.as_ref().filter(|h| h.is_open()) else {
            warn!("Send requested without a connection");
            self.sink.emit(BumpError::NotConnected.to_event());
            return;
        };

        if let Err(e) = handle.send(chunk).await {
            self.report(&e);
        }
    }

    fn owns_connection(&self, token: CorrelationToken) -> bool {
        self.state == BridgeState::Connected
            && self.handle.as_ref().map_or(false, |h| h.token() == token)
    }
}
