use super::traits::{Observer, TurnEvent};

/// Observer that drops every event.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    #[inline(always)]
    fn record_event(&self, _event: &TurnEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}
