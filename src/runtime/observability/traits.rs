use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum TurnEvent {
    TurnStart {
        turn_id: String,
        channel: String,
        conversation: String,
    },
    CommandDispatch {
        index: usize,
        kind: String,
        name: String,
        duration: Duration,
        outcome: String,
    },
    TurnEnd {
        turn_id: String,
        status: String,
        duration: Duration,
        commands: usize,
    },
    StateSaved {
        written: usize,
        deleted: usize,
        duration: Duration,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Receives turn lifecycle events; implement for any backend.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &TurnEvent);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
