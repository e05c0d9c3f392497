//! Change notifications.
//!
//! [`EventBus`] fans every emitted [`EditorEvent`] out to all live
//! subscribers. Emission never blocks; receivers that were dropped are
//! pruned on the next emit.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::nodes::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Renderable content or properties of these nodes changed.
    ObjectsChanged(Vec<NodeId>),
    /// Property panels bound to the selection should refresh.
    SelectionChanged,
}

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<flume::Sender<EditorEvent>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<EditorEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn emit(&self, event: EditorEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_every_subscriber_and_prunes_dropped() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        drop(b);

        bus.emit(EditorEvent::SelectionChanged);

        assert_eq!(a.try_iter().collect::<Vec<_>>(), vec![EditorEvent::SelectionChanged]);
        assert_eq!(bus.subscriber_count(), 1);
    }
}
