// Application event sinks

use crate::OutwardEvent;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives outward events in emission order.
/// Implementations must not block; they are called with the bridge lock held.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OutwardEvent);
}

impl EventSink for mpsc::UnboundedSender<OutwardEvent> {
    fn emit(&self, event: OutwardEvent) {
        if let Err(e) = self.send(event) {
            debug!("Event receiver dropped, discarding {}", e.0.name());
        }
    }
}
