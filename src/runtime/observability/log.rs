use super::traits::{Observer, TurnEvent};
use std::time::Duration;
use tracing::info;

/// Observer that writes each event through `tracing`.
#[derive(Debug, Default)]
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Observer for LogObserver {
    fn record_event(&self, event: &TurnEvent) {
        match event {
            TurnEvent::TurnStart {
                turn_id,
                channel,
                conversation,
            } => {
                info!(turn_id = %turn_id, channel = %channel, conversation = %conversation, "turn.start");
            }
            TurnEvent::CommandDispatch {
                index,
                kind,
                name,
                duration,
                outcome,
            } => {
                info!(
                    index = index,
                    kind = %kind,
                    name = %name,
                    duration_ms = millis(*duration),
                    outcome = %outcome,
                    "command.dispatch"
                );
            }
            TurnEvent::TurnEnd {
                turn_id,
                status,
                duration,
                commands,
            } => {
                info!(
                    turn_id = %turn_id,
                    status = %status,
                    duration_ms = millis(*duration),
                    commands = commands,
                    "turn.end"
                );
            }
            TurnEvent::StateSaved {
                written,
                deleted,
                duration,
            } => {
                info!(
                    written = written,
                    deleted = deleted,
                    duration_ms = millis(*duration),
                    "state.save"
                );
            }
            TurnEvent::Error { component, message } => {
                info!(component = %component, error = %message, "error");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
