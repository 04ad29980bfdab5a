// Scripting surface: property-bag arguments in, named events out

use crate::{BumpError, ConnectParams, EventSink, ExternalConnector, OutwardEvent, SessionController};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Named event as delivered to a scripting host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEvent {
    pub name: String,
    pub data: serde_json::Value,
}

impl From<&OutwardEvent> for ModuleEvent {
    fn from(event: &OutwardEvent) -> Self {
        Self {
            name: event.name().to_string(),
            data: event.payload(),
        }
    }
}

struct ScriptEventSink {
    tx: mpsc::UnboundedSender<ModuleEvent>,
}

impl EventSink for ScriptEventSink {
    fn emit(&self, event: OutwardEvent) {
        if self.tx.send(ModuleEvent::from(&event)).is_err() {
            debug!("Script host gone, dropping {} event", event.name());
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConnectProps {
    apikey: Option<String>,
    username: Option<String>,
    message: Option<String>,
}

pub struct BumpModule {
    controller: Arc<SessionController>,
}

impl BumpModule {
    /// Create the module and the receiver its events are fired on
    pub fn new(connector: Arc<dyn ExternalConnector>) -> (Self, mpsc::UnboundedReceiver<ModuleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = SessionController::new(connector, Arc::new(ScriptEventSink { tx }));
        (
            Self {
                controller: Arc::new(controller),
            },
            rx,
        )
    }

    /// `connect({apikey, username, message})`
    pub async fn connect(&self, props: serde_json::Value) {
        match parse_props(props) {
            Ok(params) => self.controller.connect(params).await,
            Err(e) => self.controller.report_error(e).await,
        }
    }

    /// `sendMessage(message)`
    pub async fn send_message(&self, message: &str) {
        self.controller.send(message).await;
    }

    /// `disconnect()`
    pub async fn disconnect(&self) {
        self.controller.disconnect().await;
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }
}

fn parse_props(props: serde_json::Value) -> crate::Result<ConnectParams> {
    if !props.is_object() {
        return Err(BumpError::InvalidArgument("connect expects an object".to_string()));
    }

    let props: ConnectProps = serde_json::from_value(props)
        .map_err(|e| BumpError::InvalidArgument(e.to_string()))?;

    // A missing key is caught by the controller's own validation
    Ok(ConnectParams {
        api_key: props.apikey.unwrap_or_default(),
        username: props.username,
        message: props.message,
    })
}
