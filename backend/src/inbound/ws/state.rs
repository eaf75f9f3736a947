//! Shared WebSocket adapter state.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{ChangeEvent, ChangeNotifier};

/// Capacity of the broadcast ring buffer. A lagging subscriber loses the
/// oldest events, which is harmless: events carry no payload and clients
/// re-fetch on every notification.
const CHANGE_FEED_CAPACITY: usize = 64;

/// Fan-out hub bridging domain mutations to WebSocket subscribers.
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Create a feed with the default buffer capacity.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { tx }
    }

    /// Subscribe to future change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier for ChangeFeed {
    fn publish(&self, event: ChangeEvent) {
        // send only errors when no subscriber exists, which is fine.
        if self.tx.send(event).is_err() {
            debug!(?event, "change event dropped: no subscribers");
        }
    }
}

/// Dependency bundle for the WebSocket endpoint.
pub struct WsState {
    /// Broadcast hub the connection loops subscribe to.
    pub feed: Arc<ChangeFeed>,
    /// Public HTTPS host allowed as a browser Origin, when deployed.
    pub public_host: Option<String>,
}

impl WsState {
    /// Assemble the WebSocket state.
    pub fn new(feed: Arc<ChangeFeed>, public_host: Option<String>) -> Self {
        Self { feed, public_host }
    }
}
