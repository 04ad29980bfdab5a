// Host application lifecycle for bump sessions
// Tears the session down when the host stops

use crate::SessionController;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Application state for lifecycle management
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Application is in the foreground and active
    Foreground,
    /// Application was stopped by the host
    Background,
}

/// Forwards host lifecycle callbacks to a session controller
pub struct LifecycleManager {
    app_state: Arc<RwLock<AppState>>,
    stopped_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    controller: Arc<SessionController>,
}

impl LifecycleManager {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self {
            app_state: Arc::new(RwLock::new(AppState::Foreground)),
            stopped_at: Arc::new(RwLock::new(None)),
            controller,
        }
    }

    /// Get the current application state
    pub async fn get_state(&self) -> AppState {
        *self.app_state.read().await
    }

    /// Handle the host stopping the application.
    /// Any live connection is closed and reported as a local quit.
    pub async fn on_stop(&self) {
        info!("Application stopped, tearing down bump session");

        *self.app_state.write().await = AppState::Background;
        *self.stopped_at.write().await = Some(Utc::now());

        self.controller.on_session_teardown().await;
    }

    /// Handle the application returning to the foreground.
    /// Sessions are not resumed; the application reconnects explicitly.
    pub async fn on_start(&self) {
        info!("Application returning to foreground");

        *self.app_state.write().await = AppState::Foreground;
        if let Some(stopped_at) = self.stopped_at.write().await.take() {
            debug!(
                "Application was stopped for {} seconds",
                Utc::now().signed_duration_since(stopped_at).num_seconds()
            );
        }
    }

    /// Time since the host stopped the application, if it is stopped
    pub async fn time_in_background(&self) -> Option<Duration> {
        if *self.app_state.read().await != AppState::Background {
            return None;
        }

        self.stopped_at
            .read()
            .await
            .map(|stopped_at| Utc::now().signed_duration_since(stopped_at))
    }

    /// Check if app is in background
    pub async fn is_background(&self) -> bool {
        *self.app_state.read().await == AppState::Background
    }

    /// Check if app is in foreground
    pub async fn is_foreground(&self) -> bool {
        *self.app_state.read().await == AppState::Foreground
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BridgeState, ConnectParams, DisconnectReason, LoopbackConnector, OutwardEvent};
    use tokio::sync::mpsc;
    use tokio::time::{timeout, Duration as TokioDuration};

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<OutwardEvent>) -> OutwardEvent {
        timeout(TokioDuration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_lifecycle_manager_creation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let controller = Arc::new(SessionController::new(Arc::new(LoopbackConnector::new("alice")), Arc::new(tx)));
        let manager = LifecycleManager::new(controller);

        assert_eq!(manager.get_state().await, AppState::Foreground);
        assert!(manager.time_in_background().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_tears_down_connected_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connector = LoopbackConnector::new("alice");
        let peer = connector.peer();
        let controller = Arc::new(SessionController::new(Arc::new(connector), Arc::new(tx)));
        let manager = LifecycleManager::new(Arc::clone(&controller));

        controller.connect(ConnectParams::new("key")).await;
        assert_eq!(next_event(&mut rx).await, OutwardEvent::Ready);
        assert!(matches!(next_event(&mut rx).await, OutwardEvent::Connected { .. }));

        manager.on_stop().await;

        assert!(manager.is_background().await);
        assert!(manager.time_in_background().await.is_some());
        assert_eq!(controller.state().await, BridgeState::Idle);
        assert!(peer.is_closed());
        assert_eq!(
            next_event(&mut rx).await,
            OutwardEvent::Disconnected { reason: DisconnectReason::LocalUserQuit }
        );
    }

    #[tokio::test]
    async fn test_stop_without_session_is_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = Arc::new(SessionController::new(Arc::new(LoopbackConnector::new("alice")), Arc::new(tx)));
        let manager = LifecycleManager::new(controller);

        manager.on_stop().await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_multiple_stop_start_cycles() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let controller = Arc::new(SessionController::new(Arc::new(LoopbackConnector::new("alice")), Arc::new(tx)));
        let manager = LifecycleManager::new(controller);

        manager.on_stop().await;
        manager.on_start().await;
        assert!(manager.is_foreground().await);
        assert!(manager.time_in_background().await.is_none());

        manager.on_stop().await;
        assert!(manager.is_background().await);
    }
}
