use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use turnwise::config::ExecutionConfig;
use turnwise::core::handlers::HandlerFuture;
use turnwise::core::planner::{ExecutionStatus, Planner, PlannerOutput, PromptContext};
use turnwise::core::state::{CONVERSATION_LAYER, TurnState};
use turnwise::transport::TurnContext;

use super::turn_harness::{
    RecordingOutbound, ScriptedPlanner, light_bot, lights_on, memory_storage, message,
};

fn one_second_turns(save_on_cancel: bool) -> ExecutionConfig {
    ExecutionConfig {
        turn_timeout_secs: 1,
        save_on_cancel,
        ..ExecutionConfig::default()
    }
}

fn slow_plan() -> Arc<ScriptedPlanner> {
    ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOn", "entities": {}},
        {"type": "DO", "action": "Pause", "entities": {"time": 5000}},
        {"type": "SAY", "response": "too late"}
    ])])
}

#[tokio::test]
async fn deadline_cancels_the_running_command_and_skips_the_save() {
    let app = light_bot(memory_storage(), slow_plan())
        .execution(one_second_turns(false))
        .build()
        .unwrap();
    let outbound = RecordingOutbound::new();

    let report = app
        .run_turn(message("conv-1", "on, wait, talk"), outbound.clone())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Cancelled);
    assert!(report.saved.is_none());
    let execution = report.execution.unwrap();
    assert_eq!(execution.executed.len(), 1);
    assert_eq!(execution.stopped_at, Some(1));
    assert_eq!(execution.skipped, 1);
    assert!(outbound.messages().is_empty());

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), None);
    assert!(state.history().is_empty());
}

#[tokio::test]
async fn save_on_cancel_keeps_finished_commands() {
    let app = light_bot(memory_storage(), slow_plan())
        .execution(one_second_turns(true))
        .build()
        .unwrap();

    let report = app
        .run_turn(message("conv-1", "on, wait, talk"), RecordingOutbound::new())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Cancelled);
    assert!(report.saved.is_some());
    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), Some(true));
}

struct StalledPlanner;

impl Planner for StalledPlanner {
    fn name(&self) -> &str {
        "stalled"
    }

    fn generate_plan<'a>(
        &'a self,
        _prompt: &'a PromptContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<PlannerOutput>> + Send + 'a>> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(PlannerOutput::Records(json!([])))
        })
    }
}

#[tokio::test]
async fn stalled_planner_counts_against_the_deadline() {
    let app = light_bot(memory_storage(), Arc::new(StalledPlanner))
        .execution(one_second_turns(false))
        .build()
        .unwrap();

    let report = app
        .run_turn(message("conv-1", "hello?"), RecordingOutbound::new())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Cancelled);
    assert!(report.execution.unwrap().executed.is_empty());
    assert!(report.saved.is_none());
}

fn stalled_route<'a>(_ctx: &'a TurnContext, state: &'a mut TurnState) -> HandlerFuture<'a, bool> {
    Box::pin(async move {
        state.set_value(CONVERSATION_LAYER, "lights_on", true)?;
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(true)
    })
}

#[tokio::test]
async fn stalled_route_counts_against_the_deadline() {
    let planner = ScriptedPlanner::idle();
    let app = light_bot(memory_storage(), planner.clone())
        .route("/slow", stalled_route)
        .unwrap()
        .execution(one_second_turns(false))
        .build()
        .unwrap();

    let report = app
        .run_turn(message("conv-1", "/slow"), RecordingOutbound::new())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Cancelled);
    assert_eq!(report.route.as_deref(), Some("/slow"));
    assert!(report.saved.is_none());
    assert!(planner.prompts().is_empty());

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), None);
}
