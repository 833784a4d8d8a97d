use serde_json::json;
use turnwise::TurnError;
use turnwise::core::planner::ExecutionStatus;
use turnwise::core::state::TEMP_LAYER;
use turnwise::error::{ExecutionError, RegistryError};

use super::turn_harness::{
    RecordingOutbound, ScriptedPlanner, light_bot, lights_on, memory_storage, message,
};

#[tokio::test]
async fn unregistered_action_fails_at_index_zero_without_mutation() {
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "Unregistered", "entities": {}},
        {"type": "DO", "action": "LightsOn", "entities": {}}
    ])]);
    let app = light_bot(memory_storage(), planner).build().unwrap();

    let err = app
        .run_turn(message("conv-1", "do something"), RecordingOutbound::new())
        .await
        .unwrap_err();

    assert_eq!(err.command_index(), Some(0));
    assert!(matches!(
        err,
        TurnError::Execution(ExecutionError::UnknownAction { ref action, .. }) if action == "Unregistered"
    ));

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), None);
}

#[tokio::test]
async fn false_continuation_halts_remaining_commands() {
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOn", "entities": {}},
        {"type": "DO", "action": "Stop", "entities": {}},
        {"type": "SAY", "response": "never said"},
        {"type": "DO", "action": "LightsOff", "entities": {}}
    ])]);
    let app = light_bot(memory_storage(), planner).build().unwrap();
    let outbound = RecordingOutbound::new();

    let report = app
        .run_turn(message("conv-1", "on then stop"), outbound.clone())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Halted);
    let execution = report.execution.unwrap();
    assert_eq!(execution.executed.len(), 2);
    assert_eq!(execution.stopped_at, Some(1));
    assert_eq!(execution.skipped, 2);
    assert!(outbound.messages().is_empty());

    // Work done before the halt is still saved.
    assert!(report.saved.is_some());
    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), Some(true));
}

#[tokio::test]
async fn temp_layer_carries_values_within_one_turn_only() {
    let planner = ScriptedPlanner::records([
        json!([
            {"type": "DO", "action": "Remember", "entities": {"note": "blue"}},
            {"type": "DO", "action": "Recall", "entities": {}}
        ]),
        json!([{"type": "DO", "action": "Recall", "entities": {}}]),
    ]);
    let app = light_bot(memory_storage(), planner).build().unwrap();

    let first = app
        .run_turn(message("conv-1", "remember blue"), RecordingOutbound::new())
        .await
        .unwrap();
    assert_eq!(first.outward, vec!["noted: blue"]);

    let second = app
        .run_turn(message("conv-1", "what did I say?"), RecordingOutbound::new())
        .await
        .unwrap();
    assert_eq!(second.outward, vec!["noted: nothing"]);

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert!(state.layer(TEMP_LAYER).unwrap().is_empty());
}

#[tokio::test]
async fn say_override_replaces_default_delivery() {
    let planner = ScriptedPlanner::records([json!([{"type": "SAY", "response": "hello"}])]);
    let app = light_bot(memory_storage(), planner)
        .action(
            turnwise::core::handlers::SAY_COMMAND_ACTION,
            |ctx, _state, entities, _action| {
                Box::pin(async move {
                    let text = entities
                        .get("response")
                        .and_then(|value| value.as_str())
                        .unwrap_or_default()
                        .to_uppercase();
                    ctx.send_activity(&text).await?;
                    Ok(true)
                })
            },
        )
        .unwrap()
        .build()
        .unwrap();

    let report = app
        .run_turn(message("conv-1", "greet me"), RecordingOutbound::new())
        .await
        .unwrap();
    assert_eq!(report.outward, vec!["HELLO"]);
}

#[test]
fn duplicate_handler_names_are_rejected_at_registration() {
    let err = light_bot(memory_storage(), ScriptedPlanner::records([json!([])]))
        .function("LightsOn", |_ctx, _state, _args, _name| {
            Box::pin(async move { Ok(turnwise::core::state::Value::Null) })
        })
        .err()
        .unwrap();

    assert_eq!(
        err,
        RegistryError::DuplicateHandler {
            name: "LightsOn".into()
        }
    );
}
