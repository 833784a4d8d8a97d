use super::command::{CommandType, PredictedCommand};
use super::plan::Plan;
use crate::core::handlers::{HandlerFuture, HandlerRegistry, SAY_COMMAND_ACTION};
use crate::core::history::MessageRole;
use crate::core::state::{Entities, TurnState, Value};
use crate::error::ExecutionError;
use crate::runtime::observability::{NoopObserver, Observer, TurnEvent};
use crate::transport::TurnContext;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Halted,
    Cancelled,
    Failed,
}

/// One dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub index: usize,
    pub kind: CommandType,
    pub name: String,
    pub duration: Duration,
    pub continued: bool,
    /// Messages this command sent outward.
    pub outward: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub status: ExecutionStatus,
    pub executed: Vec<CommandRecord>,
    /// Commands never dispatched because of a halt or cancellation.
    pub skipped: usize,
    /// Index of the command that halted the plan or was cut off.
    pub stopped_at: Option<usize>,
    /// Outward messages in the order they were sent.
    pub outward: Vec<String>,
}

enum Outcome {
    Continue,
    Halt,
    Cancelled,
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Halt => "halt",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Runs a validated [`Plan`] one command at a time.
///
/// A handler returning `false` halts the plan; the remaining commands are
/// skipped. A handler error or registry miss fails the plan with the index
/// of the offending command. Mutations made by earlier commands stay applied.
pub struct PlanExecutor<'r> {
    registry: &'r HandlerRegistry,
    observer: Arc<dyn Observer>,
    deadline: Option<Instant>,
}

impl<'r> PlanExecutor<'r> {
    pub fn new(registry: &'r HandlerRegistry) -> Self {
        Self {
            registry,
            observer: Arc::new(NoopObserver),
            deadline: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Commands not finished by `deadline` resolve as cancelled.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub async fn run(
        &self,
        plan: &Plan,
        ctx: &TurnContext,
        state: &mut TurnState,
    ) -> Result<ExecutionReport, ExecutionError> {
        let mut report = ExecutionReport {
            status: ExecutionStatus::Running,
            ..ExecutionReport::default()
        };
        let total = plan.len();

        for (index, command) in plan.iter().enumerate() {
            if let Some(deadline) = self.deadline
                && Instant::now() >= deadline
            {
                report.status = ExecutionStatus::Cancelled;
                report.stopped_at = Some(index);
                report.skipped = total - index;
                break;
            }

            let sent_before = ctx.sent_count();
            let started = Instant::now();
            let result = self.dispatch(index, command, ctx, state).await;
            let duration = started.elapsed();

            // Outward effects are mirrored even when the handler failed afterwards.
            let sent = ctx.sent_since(sent_before);
            for message in &sent {
                state
                    .history_mut()
                    .append(MessageRole::Assistant, message.clone());
            }
            report.outward.extend(sent.iter().cloned());

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(error) => {
                    self.observer.record_event(&TurnEvent::CommandDispatch {
                        index,
                        kind: command.command_type().to_string(),
                        name: command.name().to_string(),
                        duration,
                        outcome: "error".into(),
                    });
                    tracing::warn!(
                        turn_id = %ctx.turn_id(),
                        index,
                        action = %error.action(),
                        error = %error,
                        "plan failed"
                    );
                    return Err(error);
                }
            };

            self.observer.record_event(&TurnEvent::CommandDispatch {
                index,
                kind: command.command_type().to_string(),
                name: command.name().to_string(),
                duration,
                outcome: outcome.label().into(),
            });

            if let Outcome::Cancelled = outcome {
                report.status = ExecutionStatus::Cancelled;
                report.stopped_at = Some(index);
                report.skipped = total - index - 1;
                break;
            }

            let continued = matches!(outcome, Outcome::Continue);
            report.executed.push(CommandRecord {
                index,
                kind: command.command_type(),
                name: command.name().to_string(),
                duration,
                continued,
                outward: sent,
            });

            if !continued {
                report.status = ExecutionStatus::Halted;
                report.stopped_at = Some(index);
                report.skipped = total - index - 1;
                break;
            }
        }

        if report.status == ExecutionStatus::Running {
            report.status = ExecutionStatus::Completed;
        }

        tracing::debug!(
            turn_id = %ctx.turn_id(),
            status = %report.status,
            executed = report.executed.len(),
            skipped = report.skipped,
            "plan finished"
        );
        Ok(report)
    }

    async fn dispatch(
        &self,
        index: usize,
        command: &PredictedCommand,
        ctx: &TurnContext,
        state: &mut TurnState,
    ) -> Result<Outcome, ExecutionError> {
        match command {
            PredictedCommand::Do(command) => {
                let handler = self.registry.resolve(&command.action).map_err(|_| {
                    ExecutionError::UnknownAction {
                        index,
                        action: command.action.clone(),
                    }
                })?;
                let call = handler.call(ctx, state, &command.entities, &command.action);
                self.finish(index, &command.action, call).await
            }
            PredictedCommand::Say(command) => match self.registry.say_override() {
                Some(handler) => {
                    let entities = Entities::from([(
                        "response".to_string(),
                        Value::from(command.response.as_str()),
                    )]);
                    let call = handler.call(ctx, state, &entities, SAY_COMMAND_ACTION);
                    self.finish(index, SAY_COMMAND_ACTION, call).await
                }
                None => {
                    let response = command.response.as_str();
                    let call: HandlerFuture<'_, bool> = Box::pin(async move {
                        ctx.send_activity(response).await?;
                        Ok(true)
                    });
                    self.finish(index, "SAY", call).await
                }
            },
        }
    }

    async fn finish(
        &self,
        index: usize,
        action: &str,
        call: HandlerFuture<'_, bool>,
    ) -> Result<Outcome, ExecutionError> {
        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result,
                Err(_) => return Ok(Outcome::Cancelled),
            },
            None => call.await,
        };

        match result {
            Ok(true) => Ok(Outcome::Continue),
            Ok(false) => Ok(Outcome::Halt),
            Err(source) => Err(ExecutionError::Handler {
                index,
                action: action.to_string(),
                source,
            }),
        }
    }
}
