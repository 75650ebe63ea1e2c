//! Notifier that records events for assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::notifier::{Event, Notifier};

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Kind tags of order events, in emission order.
    pub fn order_kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Order(order) => Some(order.kind.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of events with the given kind tag.
    pub fn count(&self, kind: &str) -> usize {
        self.events.lock().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}
