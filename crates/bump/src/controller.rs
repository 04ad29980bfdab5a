// Session Controller - application facade over the connection bridge

use crate::{
    BridgeState, BumpError, ConnectParams, ConnectionBridge, CorrelationToken, EventSink,
    ExternalConnector, NotificationSender, OutwardEvent, Result,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Owns one session: the bridge, the connector used to start attempts,
/// and the task draining connector notifications into the bridge.
pub struct SessionController {
    bridge: Arc<Mutex<ConnectionBridge>>,
    connector: Arc<dyn ExternalConnector>,
    notifier: NotificationSender,
    params: RwLock<Option<Arc<ConnectParams>>>,
    pump_handle: JoinHandle<()>,
}

impl SessionController {
    /// Create a controller and start its notification pump.
    /// Must be called from within a tokio runtime.
    pub fn new(connector: Arc<dyn ExternalConnector>, sink: Arc<dyn EventSink>) -> Self {
        let bridge = Arc::new(Mutex::new(ConnectionBridge::new(sink)));
        let (notifier, mut rx) = NotificationSender::channel();

        let pump_bridge = Arc::clone(&bridge);
        let pump_handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                pump_bridge.lock().await.apply(notification).await;
            }
            debug!("Notification channel closed");
        });

        Self {
            bridge,
            connector,
            notifier,
            params: RwLock::new(None),
            pump_handle,
        }
    }

    /// Start a connect attempt.
    ///
    /// Emits `Ready` once the connector accepted the attempt; the outcome
    /// arrives later as `Connected`, `Cancel` or `Error`. Problems are
    /// reported as events, never returned.
    pub async fn connect(&self, params: ConnectParams) {
        let mut bridge = self.bridge.lock().await;

        if let Err(e) = validate(&params) {
            bridge.report(&e);
            return;
        }

        let token = CorrelationToken::new();
        if let Err(e) = bridge.begin_attempt(token) {
            bridge.report(&e);
            return;
        }

        info!(
            "Launching connect attempt {} via {}",
            token,
            self.connector.connector_name()
        );

        // Lock is held until Ready is out, so an immediate result queues behind it
        match self
            .connector
            .begin_connect(&params, token, self.notifier.clone())
            .await
        {
            Ok(()) => {
                *self.params.write().await = Some(Arc::new(params));
                bridge.emit(OutwardEvent::Ready);
            }
            Err(e) => {
                bridge.report(&e);
                bridge.abort_attempt(token);
            }
        }
    }

    /// Send a text message to the connected peer as UTF-8
    pub async fn send(&self, message: &str) {
        self.bridge.lock().await.send(message.as_bytes()).await;
    }

    /// Disconnect the current peer. No event if nothing is connected.
    pub async fn disconnect(&self) {
        if !self.bridge.lock().await.local_disconnect().await {
            debug!("Disconnect requested with no live connection");
        }
    }

    /// Called by the host when the application stops
    pub async fn on_session_teardown(&self) {
        info!("Session teardown requested by host");
        self.disconnect().await;
    }

    /// Surface an error raised outside the controller through the same sink
    pub async fn report_error(&self, err: BumpError) {
        self.bridge.lock().await.report(&err);
    }

    pub async fn state(&self) -> BridgeState {
        self.bridge.lock().await.state()
    }

    pub async fn is_connected(&self) -> bool {
        self.bridge.lock().await.is_connected()
    }

    pub async fn peer_username(&self) -> Option<String> {
        self.bridge.lock().await.peer_username().map(str::to_string)
    }

    /// Params of the most recent accepted connect attempt
    pub async fn current_params(&self) -> Option<Arc<ConnectParams>> {
        self.params.read().await.clone()
    }

    pub fn connector_name(&self) -> &str {
        self.connector.connector_name()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.pump_handle.abort();
    }
}

fn validate(params: &ConnectParams) -> Result<()> {
    if params.api_key.trim().is_empty() {
        return Err(BumpError::InvalidArgument("apikey is required".to_string()));
    }
    Ok(())
}
