use serde_json::json;
use turnwise::core::planner::ExecutionStatus;
use turnwise::core::state::Entities;
use turnwise::transport::TurnContext;

use super::turn_harness::{
    RecordingOutbound, ScriptedPlanner, light_bot, lights_on, memory_storage, message,
};

#[tokio::test]
async fn lights_on_then_say_runs_both_commands_and_persists() {
    let storage = memory_storage();
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOn", "entities": {}},
        {"type": "SAY", "response": "done"}
    ])]);
    let app = light_bot(storage.clone(), planner).build().unwrap();
    let outbound = RecordingOutbound::new();

    let report = app
        .run_turn(message("conv-1", "lights on"), outbound.clone())
        .await
        .unwrap();

    assert_eq!(report.status, ExecutionStatus::Completed);
    assert_eq!(report.outward, vec!["done"]);
    assert_eq!(outbound.messages(), vec!["done"]);

    let execution = report.execution.unwrap();
    assert_eq!(execution.executed.len(), 2);
    assert!(execution.executed[0].outward.is_empty());
    assert_eq!(execution.executed[1].outward, vec!["done"]);
    assert_eq!(execution.skipped, 0);

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), Some(true));
}

#[tokio::test]
async fn planner_sees_registered_actions_and_prior_turns() {
    let planner = ScriptedPlanner::records([
        json!([{"type": "DO", "action": "LightsOff", "entities": {}}]),
        json!([{"type": "SAY", "response": "they are off"}]),
    ]);
    let app = light_bot(memory_storage(), planner.clone()).build().unwrap();
    let outbound = RecordingOutbound::new();

    app.run_turn(message("conv-1", "lights off"), outbound.clone())
        .await
        .unwrap();
    app.run_turn(message("conv-1", "are they off?"), outbound.clone())
        .await
        .unwrap();

    let prompts = planner.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].history, "");
    assert_eq!(prompts[0].input, "lights off");
    assert!(prompts[0].actions.contains(&"LightsOff".to_string()));
    assert!(!prompts[0].actions.contains(&"getLightStatus".to_string()));
    assert_eq!(
        prompts[1].history,
        "User: lights off\n\nAssistant: [lights off]"
    );
}

#[tokio::test]
async fn functions_read_state_written_by_actions() {
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOn", "entities": {}}
    ])]);
    let app = light_bot(memory_storage(), planner).build().unwrap();
    app.run_turn(message("conv-1", "lights on"), RecordingOutbound::new())
        .await
        .unwrap();

    let activity = message("conv-1", "status?");
    let mut state = app.load_state(&activity).await.unwrap();
    let ctx = TurnContext::new(activity, RecordingOutbound::new());
    let status = app
        .call_function(&ctx, &mut state, "getLightStatus", &Entities::new())
        .await
        .unwrap();
    assert_eq!(status.as_str(), Some("on"));
}

#[tokio::test]
async fn model_text_without_json_is_spoken_verbatim() {
    let planner = ScriptedPlanner::new([turnwise::core::planner::PlannerOutput::Text(
        "  Sure, the lights are on.  ".into(),
    )]);
    let app = light_bot(memory_storage(), planner).build().unwrap();

    let report = app
        .run_turn(message("conv-1", "lights?"), RecordingOutbound::new())
        .await
        .unwrap();
    assert_eq!(report.outward, vec!["Sure, the lights are on."]);
}

#[tokio::test]
async fn plan_after_bracketed_prose_still_runs() {
    let planner = ScriptedPlanner::new([turnwise::core::planner::PlannerOutput::Text(
        "[lights] {\"type\": \"plan\", \"commands\": [\
            {\"type\": \"DO\", \"action\": \"LightsOn\", \"entities\": {}}]}"
            .into(),
    )]);
    let app = light_bot(memory_storage(), planner).build().unwrap();

    let report = app
        .run_turn(message("conv-1", "lights on"), RecordingOutbound::new())
        .await
        .unwrap();

    assert!(report.outward.is_empty());
    assert_eq!(report.execution.unwrap().executed[0].name, "LightsOn");
    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), Some(true));
}
