use std::sync::Arc;

use serde_json::json;
use turnwise::app::history_route;
use turnwise::core::history::CharTokenizer;

use super::turn_harness::{RecordingOutbound, ScriptedPlanner, light_bot, memory_storage, message};

#[tokio::test]
async fn history_route_answers_without_the_planner() {
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOff", "entities": {}}
    ])]);
    let app = light_bot(memory_storage(), planner.clone())
        .route("/history", history_route(2000, Arc::new(CharTokenizer), "\n\n"))
        .unwrap()
        .build()
        .unwrap();

    app.run_turn(message("conv-1", "lights off"), RecordingOutbound::new())
        .await
        .unwrap();

    let outbound = RecordingOutbound::new();
    let report = app
        .run_turn(message("conv-1", "  /HISTORY "), outbound.clone())
        .await
        .unwrap();

    assert_eq!(report.route.as_deref(), Some("/history"));
    assert!(report.execution.is_none());
    assert_eq!(
        outbound.messages(),
        vec!["User: lights off\n\nAssistant: [lights off]"]
    );
    assert_eq!(planner.prompts().len(), 1);

    // The route exchange itself stays out of the transcript.
    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(state.history().len(), 2);
}

#[tokio::test]
async fn history_route_on_fresh_conversation() {
    let app = light_bot(memory_storage(), ScriptedPlanner::idle())
        .route("/history", history_route(2000, Arc::new(CharTokenizer), "\n\n"))
        .unwrap()
        .build()
        .unwrap();

    let report = app
        .run_turn(message("conv-new", "/history"), RecordingOutbound::new())
        .await
        .unwrap();
    assert_eq!(report.outward, vec!["No history yet."]);
}
