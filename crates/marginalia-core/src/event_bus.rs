//! Change notifications for the UI shell.
//!
//! The repository publishes what changed; whoever renders the notes (the
//! web-view shell, the quick capture popup) subscribes and re-reads the
//! state it needs. Events carry a topic and a JSON payload.
//!
//! # Example
//!
//! ```rust
//! use marginalia_core::event_bus::{EventBus, NOTES_CHANGED};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.emit(NOTES_CHANGED, &serde_json::json!({"count": 3}));
//!
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.event_type, NOTES_CHANGED);
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// The note collection changed. Payload: `{"count": usize}`.
pub const NOTES_CHANGED: &str = "notes:changed";

/// The save status changed. Payload: `SaveStatus`.
pub const SAVE_STATUS: &str = "notes:save-status";

/// A pending delete was created, undone, dismissed or expired.
/// Payload: `PendingDelete` or `null`.
pub const PENDING_DELETE: &str = "notes:pending-delete";

/// Settings were saved. Payload: `AppSettings`.
pub const SETTINGS_CHANGED: &str = "settings:changed";

/// Events beyond this capacity make slow subscribers lag.
const DEFAULT_CAPACITY: usize = 256;

/// A broadcast event containing a topic and JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl BroadcastEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Broadcasts events to any number of subscribers.
pub struct EventBus {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it; with no
    /// subscribers the event is dropped.
    pub fn emit<T: Serialize + ?Sized>(&self, event_type: &str, payload: &T) -> usize {
        let json_payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to serialize {} payload: {}", event_type, e);
                return 0;
            }
        };

        self.sender
            .send(BroadcastEvent::new(event_type, json_payload))
            .unwrap_or(0)
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emit_without_subscribers_drops_event() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(NOTES_CHANGED, &json!({"count": 1})), 0);
    }

    #[test]
    fn subscriber_count_tracks_receivers() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_event() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.emit(SAVE_STATUS, &json!({"state": "saving"})), 2);

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1.event_type, SAVE_STATUS);
        assert_eq!(e1.payload, e2.payload);
    }

    #[tokio::test]
    async fn events_arrive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(NOTES_CHANGED, &json!({"count": 1}));
        bus.emit(NOTES_CHANGED, &json!({"count": 2}));

        assert_eq!(rx.recv().await.unwrap().payload["count"], 1);
        assert_eq!(rx.recv().await.unwrap().payload["count"], 2);
    }

    #[test]
    fn null_payload_is_allowed() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(PENDING_DELETE, &Option::<u32>::None);

        let event = rx.try_recv().unwrap();
        assert!(event.payload.is_null());
    }
}
