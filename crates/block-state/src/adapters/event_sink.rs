use parking_lot::Mutex;

use crate::events::BlockStateEvent;
use crate::ports::{BlockStateEventSink, PublishError};

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl BlockStateEventSink for NoOpEventSink {
    fn publish(&self, _event: BlockStateEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Records events in memory, in publish order.
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<BlockStateEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BlockStateEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<BlockStateEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl BlockStateEventSink for InMemoryEventSink {
    fn publish(&self, event: BlockStateEvent) -> Result<(), PublishError> {
        self.events.lock().push(event);
        Ok(())
    }
}
