use std::sync::Arc;

use serde_json::json;
use turnwise::config::StorageConfig;
use turnwise::core::storage::{SqliteStorage, create_storage};

use super::turn_harness::{RecordingOutbound, ScriptedPlanner, light_bot, lights_on, message};

#[tokio::test]
async fn state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    {
        let storage = Arc::new(SqliteStorage::open(&path).await.unwrap());
        let planner = ScriptedPlanner::records([json!([
            {"type": "DO", "action": "LightsOn", "entities": {}},
            {"type": "SAY", "response": "done"}
        ])]);
        let app = light_bot(storage, planner).build().unwrap();
        app.run_turn(message("conv-1", "lights on"), RecordingOutbound::new())
            .await
            .unwrap();
    }

    let storage = Arc::new(SqliteStorage::open(&path).await.unwrap());
    let app = light_bot(storage, ScriptedPlanner::idle())
        .build()
        .unwrap();
    let state = app.load_state(&message("conv-1", "")).await.unwrap();

    assert_eq!(lights_on(&state), Some(true));
    let texts: Vec<_> = state.history().entries().map(|entry| entry.text.clone()).collect();
    assert_eq!(texts, vec!["lights on", "done"]);
}

#[tokio::test]
async fn configured_sqlite_backend_resolves_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        backend: "sqlite".into(),
        path: "nested.db".into(),
    };

    let storage = create_storage(&config, dir.path()).await.unwrap();
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOff", "entities": {}}
    ])]);
    let app = light_bot(storage, planner).build().unwrap();
    app.run_turn(message("conv-1", "off"), RecordingOutbound::new())
        .await
        .unwrap();

    assert!(dir.path().join("nested.db").exists());
    let state = app.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), Some(false));
}

#[tokio::test]
async fn deleted_conversation_stays_deleted_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");
    let planner = ScriptedPlanner::records([json!([
        {"type": "DO", "action": "LightsOn", "entities": {}}
    ])]);

    let app = light_bot(Arc::new(SqliteStorage::open(&path).await.unwrap()), planner)
        .build()
        .unwrap();
    app.run_turn(message("conv-1", "on"), RecordingOutbound::new())
        .await
        .unwrap();

    let mut state = app.load_state(&message("conv-1", "")).await.unwrap();
    state.delete_layer("conversation").unwrap();
    let report = state.save().await.unwrap();
    assert_eq!(report.deleted.len(), 1);

    let reopened = light_bot(
        Arc::new(SqliteStorage::open(&path).await.unwrap()),
        ScriptedPlanner::idle(),
    )
    .build()
    .unwrap();
    let state = reopened.load_state(&message("conv-1", "")).await.unwrap();
    assert_eq!(lights_on(&state), None);
    assert!(state.history().is_empty());
}
