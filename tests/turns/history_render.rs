use serde_json::json;
use turnwise::config::HistoryConfig;
use turnwise::core::history::CharTokenizer;

use super::turn_harness::{RecordingOutbound, ScriptedPlanner, light_bot, memory_storage, message};

fn reply_plan(turn: usize) -> serde_json::Value {
    json!([{"type": "SAY", "response": format!("reply {turn:02} {}", "x".repeat(80))}])
}

#[tokio::test]
async fn long_conversations_render_within_budget_in_order() {
    let turns = 30;
    let planner = ScriptedPlanner::records((0..turns).map(reply_plan));
    let app = light_bot(memory_storage(), planner).build().unwrap();

    for turn in 0..turns {
        app.run_turn(
            message("conv-1", &format!("question {turn:02}")),
            RecordingOutbound::new(),
        )
        .await
        .unwrap();
    }

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(state.history().len(), 50);

    let rendered = state.history().render(2000, &CharTokenizer, "\n\n");
    assert!(rendered.chars().count() <= 2000);
    assert!(rendered.ends_with(&format!("reply 29 {}", "x".repeat(80))));
    assert!(!rendered.contains("question 00"));

    let positions: Vec<usize> = (20..turns)
        .filter_map(|turn| rendered.find(&format!("question {turn:02}")))
        .collect();
    assert!(positions.len() > 1);
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn history_limit_comes_from_config() {
    let planner = ScriptedPlanner::records((0..5).map(reply_plan));
    let app = light_bot(memory_storage(), planner)
        .history(HistoryConfig {
            max_entries: 4,
            ..HistoryConfig::default()
        })
        .build()
        .unwrap();

    for turn in 0..5 {
        app.run_turn(
            message("conv-1", &format!("question {turn:02}")),
            RecordingOutbound::new(),
        )
        .await
        .unwrap();
    }

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    let texts: Vec<_> = state.history().entries().map(|entry| entry.text.clone()).collect();
    assert_eq!(texts.len(), 4);
    assert_eq!(texts[0], "question 03");
    assert_eq!(texts[2], "question 04");
}

#[tokio::test]
async fn blank_input_is_not_recorded() {
    let planner = ScriptedPlanner::records([json!([{"type": "SAY", "response": "hi"}])]);
    let app = light_bot(memory_storage(), planner).build().unwrap();

    app.run_turn(message("conv-1", "   "), RecordingOutbound::new())
        .await
        .unwrap();

    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    let texts: Vec<_> = state.history().entries().map(|entry| entry.text.clone()).collect();
    assert_eq!(texts, vec!["hi"]);
}
