use std::sync::Arc;

use serde_json::json;
use turnwise::TurnError;
use turnwise::config::ExecutionConfig;
use turnwise::core::history::MessageRole;
use turnwise::error::{ExecutionError, PlanError};

use super::turn_harness::{
    FailingPlanner, RecordingOutbound, ScriptedPlanner, light_bot, lights_on, memory_storage,
    message,
};

const APOLOGY: &str = "The bot encountered an error or bug.";

fn exploding_plan() -> Arc<ScriptedPlanner> {
    ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOn", "entities": {}},
        {"type": "DO", "action": "Explode", "entities": {}},
        {"type": "SAY", "response": "unreachable"}
    ])])
}

#[tokio::test]
async fn handler_failure_apologises_and_keeps_completed_work() {
    let app = light_bot(memory_storage(), exploding_plan()).build().unwrap();
    let outbound = RecordingOutbound::new();

    let err = app
        .run_turn(message("conv-1", "on and boom"), outbound.clone())
        .await
        .unwrap_err();

    assert_eq!(err.command_index(), Some(1));
    assert!(matches!(
        err,
        TurnError::Execution(ExecutionError::Handler { ref action, .. }) if action == "Explode"
    ));
    assert_eq!(outbound.messages(), vec!["about to fail", APOLOGY]);

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), Some(true));
    let history: Vec<_> = state
        .history()
        .entries()
        .map(|entry| (entry.role, entry.text.as_str()))
        .collect();
    assert_eq!(
        history,
        vec![
            (MessageRole::User, "on and boom"),
            (MessageRole::Assistant, "about to fail"),
        ]
    );
}

#[tokio::test]
async fn save_on_error_disabled_discards_the_turn() {
    let app = light_bot(memory_storage(), exploding_plan())
        .execution(ExecutionConfig {
            save_on_error: false,
            ..ExecutionConfig::default()
        })
        .build()
        .unwrap();

    app.run_turn(message("conv-1", "on and boom"), RecordingOutbound::new())
        .await
        .unwrap_err();

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), None);
    assert!(state.history().is_empty());
}

#[tokio::test]
async fn unavailable_planner_is_transient() {
    let app = light_bot(memory_storage(), Arc::new(FailingPlanner))
        .build()
        .unwrap();
    let outbound = RecordingOutbound::new();

    let err = app
        .run_turn(message("conv-1", "hello"), outbound.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Planner(_)));
    assert!(err.is_transient());
    assert!(err.to_string().contains("503"));
    assert_eq!(outbound.messages(), vec![APOLOGY]);
}

#[tokio::test]
async fn malformed_command_runs_nothing() {
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOn", "entities": {}},
        {"type": "DO", "entities": {}}
    ])]);
    let app = light_bot(memory_storage(), planner).build().unwrap();

    let err = app
        .run_turn(message("conv-1", "lights"), RecordingOutbound::new())
        .await
        .unwrap_err();

    assert!(err.is_malformed_command());
    assert!(matches!(
        err,
        TurnError::Plan(PlanError::MalformedCommand { index: 1, .. })
    ));
    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), None);
}

#[tokio::test]
async fn custom_apology_is_used() {
    let app = light_bot(memory_storage(), Arc::new(FailingPlanner))
        .execution(ExecutionConfig {
            apology_message: "Sorry, try again later.".into(),
            ..ExecutionConfig::default()
        })
        .build()
        .unwrap();
    let outbound = RecordingOutbound::new();

    app.run_turn(message("conv-1", "hello"), outbound.clone())
        .await
        .unwrap_err();
    assert_eq!(outbound.messages(), vec!["Sorry, try again later."]);
}
