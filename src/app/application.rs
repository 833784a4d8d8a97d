use super::routes::MessageRoutes;
use crate::config::{ExecutionConfig, HistoryConfig};
use crate::core::handlers::HandlerRegistry;
use crate::core::history::{MessageRole, Tokenizer};
use crate::core::planner::{
    ExecutionReport, ExecutionStatus, PlanExecutor, Planner, PromptContext,
};
use crate::core::state::{Entities, SaveReport, StateLoader, TurnState, Value, load_scoped_state};
use crate::error::{ExecutionError, PlannerError, StorageError, TurnError};
use crate::runtime::observability::{Observer, TurnEvent};
use crate::transport::{Activity, Outbound, TurnContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one successful turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub turn_id: String,
    pub status: ExecutionStatus,
    /// Normalized route pattern when a message route handled the turn.
    pub route: Option<String>,
    /// Present when the planner path ran.
    pub execution: Option<ExecutionReport>,
    pub outward: Vec<String>,
    /// `None` when the turn was not persisted.
    pub saved: Option<SaveReport>,
}

/// The turn driver: load state, plan, execute, persist.
///
/// Cheap to share behind an `Arc`; turns for different conversations may run
/// concurrently because each gets its own [`TurnState`].
pub struct Application {
    pub(super) loader: StateLoader,
    pub(super) planner: Arc<dyn Planner>,
    pub(super) observer: Arc<dyn Observer>,
    pub(super) registry: HandlerRegistry,
    pub(super) routes: MessageRoutes,
    pub(super) tokenizer: Arc<dyn Tokenizer>,
    pub(super) history: HistoryConfig,
    pub(super) execution: ExecutionConfig,
}

impl Application {
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &StateLoader {
        &self.loader
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    pub async fn load_state(&self, activity: &Activity) -> Result<TurnState, TurnError> {
        load_scoped_state(&self.loader, activity).await
    }

    /// Invoke a registered function, e.g. while assembling a prompt.
    pub async fn call_function(
        &self,
        ctx: &TurnContext,
        state: &mut TurnState,
        name: &str,
        args: &Entities,
    ) -> Result<Value, TurnError> {
        let function = self.registry.resolve_function(name)?;
        let value = function.call(ctx, state, args, name).await?;
        Ok(value)
    }

    /// What the planner is shown for this turn.
    pub fn prompt_context(&self, activity: &Activity, state: &TurnState) -> PromptContext {
        PromptContext {
            input: activity.text.clone(),
            history: state.history().render(
                self.history.render_max_chars,
                self.tokenizer.as_ref(),
                &self.history.separator,
            ),
            channel_id: activity.channel_id.clone(),
            conversation_id: activity.conversation_id.clone(),
            user_id: activity.user_id.clone(),
            actions: self
                .registry
                .action_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Run one turn end to end.
    ///
    /// On failure the apology message is sent and, when `save_on_error` is
    /// set, the work of commands that finished is persisted before the error
    /// is returned. Storage failures are never followed by another save.
    pub async fn run_turn(
        &self,
        activity: Activity,
        outbound: Arc<dyn Outbound>,
    ) -> Result<TurnReport, TurnError> {
        let started = Instant::now();
        let deadline = (self.execution.turn_timeout_secs > 0)
            .then(|| started + Duration::from_secs(self.execution.turn_timeout_secs));
        let ctx = TurnContext::new(activity, outbound);

        self.observer.record_event(&TurnEvent::TurnStart {
            turn_id: ctx.turn_id().to_string(),
            channel: ctx.activity().channel_id.clone(),
            conversation: ctx.activity().conversation_id.clone(),
        });

        let mut state = match self.load_state(ctx.activity()).await {
            Ok(state) => state,
            Err(error) => return Err(self.fail(&ctx, None, error, started).await),
        };

        let result = match self.routes.find(&ctx.activity().text) {
            Some((pattern, route)) => {
                let pattern = pattern.to_string();
                let call = route.call(&ctx, &mut state);
                let outcome = match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline, call).await.ok(),
                    None => Some(call.await),
                };
                match outcome {
                    None => Ok((ExecutionStatus::Cancelled, Some(pattern), None)),
                    Some(Ok(_)) => Ok((ExecutionStatus::Completed, Some(pattern), None)),
                    Some(Err(source)) => Err(TurnError::from(ExecutionError::Handler {
                        index: 0,
                        action: pattern,
                        source,
                    })),
                }
            }
            None => self
                .plan_and_execute(&ctx, &mut state, deadline)
                .await
                .map(|report| (report.status, None, Some(report))),
        };

        let (status, route, execution) = match result {
            Ok(done) => done,
            Err(error) => return Err(self.fail(&ctx, Some(&mut state), error, started).await),
        };

        let saved = if status == ExecutionStatus::Cancelled && !self.execution.save_on_cancel {
            tracing::warn!(turn_id = %ctx.turn_id(), "turn cancelled at deadline, state not saved");
            None
        } else {
            match self.save(&mut state).await {
                Ok(report) => Some(report),
                Err(error) => {
                    return Err(self.fail(&ctx, None, error.into(), started).await);
                }
            }
        };

        self.observer.record_event(&TurnEvent::TurnEnd {
            turn_id: ctx.turn_id().to_string(),
            status: status.to_string(),
            duration: started.elapsed(),
            commands: execution.as_ref().map_or(0, |report| report.executed.len()),
        });

        Ok(TurnReport {
            turn_id: ctx.turn_id().to_string(),
            status,
            route,
            execution,
            outward: ctx.sent_messages(),
            saved,
        })
    }

    async fn plan_and_execute(
        &self,
        ctx: &TurnContext,
        state: &mut TurnState,
        deadline: Option<Instant>,
    ) -> Result<ExecutionReport, TurnError> {
        let prompt = self.prompt_context(ctx.activity(), state);
        if self.history.record_input && !prompt.input.trim().is_empty() {
            state
                .history_mut()
                .append(MessageRole::User, prompt.input.clone());
        }

        let generated = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.planner.generate_plan(&prompt)).await
                {
                    Ok(generated) => generated,
                    Err(_) => {
                        return Ok(ExecutionReport {
                            status: ExecutionStatus::Cancelled,
                            ..ExecutionReport::default()
                        });
                    }
                }
            }
            None => self.planner.generate_plan(&prompt).await,
        };
        let output = generated.map_err(PlannerError::Unavailable)?;
        let plan = output.into_plan()?;

        tracing::debug!(
            turn_id = %ctx.turn_id(),
            planner = self.planner.name(),
            commands = plan.len(),
            "plan received"
        );

        let mut executor =
            PlanExecutor::new(&self.registry).with_observer(Arc::clone(&self.observer));
        if let Some(deadline) = deadline {
            executor = executor.with_deadline(deadline);
        }
        Ok(executor.run(&plan, ctx, state).await?)
    }

    async fn save(&self, state: &mut TurnState) -> Result<SaveReport, StorageError> {
        let started = Instant::now();
        let report = state.save().await?;
        self.observer.record_event(&TurnEvent::StateSaved {
            written: report.written.len(),
            deleted: report.deleted.len(),
            duration: started.elapsed(),
        });
        Ok(report)
    }

    /// Apologise, persist what succeeded when allowed, and hand the error back.
    async fn fail(
        &self,
        ctx: &TurnContext,
        state: Option<&mut TurnState>,
        error: TurnError,
        started: Instant,
    ) -> TurnError {
        self.observer.record_event(&TurnEvent::Error {
            component: error_component(&error).into(),
            message: error.to_string(),
        });
        tracing::warn!(
            turn_id = %ctx.turn_id(),
            command_index = ?error.command_index(),
            error = %error,
            "turn failed"
        );

        if let Err(send_error) = ctx.send_activity(&self.execution.apology_message).await {
            tracing::warn!(turn_id = %ctx.turn_id(), error = %send_error, "apology not delivered");
        }

        if let Some(state) = state
            && self.execution.save_on_error
            && !error.is_storage_failure()
            && let Err(save_error) = self.save(state).await
        {
            tracing::warn!(
                turn_id = %ctx.turn_id(),
                error = %save_error,
                "state not saved after failed turn"
            );
        }

        self.observer.record_event(&TurnEvent::TurnEnd {
            turn_id: ctx.turn_id().to_string(),
            status: ExecutionStatus::Failed.to_string(),
            duration: started.elapsed(),
            commands: 0,
        });
        error
    }
}

fn error_component(error: &TurnError) -> &'static str {
    match error {
        TurnError::Plan(_) => "plan",
        TurnError::Registry(_) => "registry",
        TurnError::Execution(_) => "execution",
        TurnError::State(_) => "state",
        TurnError::Storage(_) => "storage",
        TurnError::Planner(_) => "planner",
        TurnError::Config(_) => "config",
        TurnError::Other(_) => "other",
    }
}
