//! Recording `EventSink` double.

use forge_core::events::{Event, EventSink};
use parking_lot::Mutex;

/// An `EventSink` that appends every emitted event to an in-memory log, so
/// tests can assert on emission order and content (§8 invariant 8).
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}
