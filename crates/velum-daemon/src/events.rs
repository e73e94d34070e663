//! Event fan-out to RPC subscribers.
//!
//! Every successful operation (and a halt) produces one [`PoolEvent`].
//! Subscribers each get an independent broadcast buffer; a slow consumer
//! lags and loses old events rather than blocking the pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use velum_types::events::PoolEvent;

/// Event bus for broadcasting pool events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: PoolEvent) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(PoolEvent::Initialized {
            authority: [0xAD; 32],
            timestamp: 1_700_000_000,
        });

        let event = rx.try_recv().expect("receive event");
        assert!(matches!(event, PoolEvent::Initialized { .. }));
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(16);
        bus.emit(PoolEvent::Halted {
            reason: "test".to_string(),
            timestamp: 0,
        });
        assert_eq!(bus.sequence(), 1);
    }
}
