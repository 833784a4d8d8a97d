use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::json;
use turnwise::core::handlers::ActionHandler;
use turnwise::core::planner::{Planner, PlannerOutput, PromptContext};
use turnwise::core::state::USER_LAYER;
use turnwise::transport::Activity;

use super::turn_harness::{RecordingOutbound, light_bot, lights_on, memory_storage, message};

/// Maps "on" and "off" to the matching light action.
struct SwitchPlanner;

impl Planner for SwitchPlanner {
    fn name(&self) -> &str {
        "switch"
    }

    fn generate_plan<'a>(
        &'a self,
        prompt: &'a PromptContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<PlannerOutput>> + Send + 'a>> {
        Box::pin(async move {
            let action = if prompt.input == "on" { "LightsOn" } else { "LightsOff" };
            Ok(PlannerOutput::Records(json!([
                {"type": "DO", "action": "Pause", "entities": {"time": 5}},
                {"type": "DO", "action": action, "entities": {}}
            ])))
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_conversations_do_not_share_state() {
    let storage = memory_storage();
    let app = Arc::new(light_bot(storage, Arc::new(SwitchPlanner)).build().unwrap());
    let outbound = RecordingOutbound::new();

    let mut tasks = Vec::new();
    for id in 0..8 {
        let app = Arc::clone(&app);
        let outbound = outbound.clone();
        tasks.push(tokio::spawn(async move {
            let conversation = format!("conv-{id}");
            let text = if id % 2 == 0 { "on" } else { "off" };
            app.run_turn(message(&conversation, text), outbound)
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for id in 0..8 {
        let conversation = format!("conv-{id}");
        let state = app.load_state(&message(&conversation, "")).await.unwrap();
        assert_eq!(lights_on(&state), Some(id % 2 == 0), "{conversation}");

        let expected: Vec<String> = if id % 2 == 0 {
            Vec::new()
        } else {
            vec!["[lights off]".to_string()]
        };
        assert_eq!(outbound.messages_for(&conversation), expected);
    }
}

#[tokio::test]
async fn user_layer_follows_the_user_across_conversations() {
    let app = light_bot(memory_storage(), Arc::new(SwitchPlanner))
        .action("SetName", |_ctx, state, _entities, _action| {
            Box::pin(async move {
                state.set_value(USER_LAYER, "name", "Ada")?;
                Ok(true)
            })
        })
        .unwrap()
        .build()
        .unwrap();

    let activity = message("conv-a", "");
    let mut state = app.load_state(&activity).await.unwrap();
    let ctx = turnwise::transport::TurnContext::new(activity, RecordingOutbound::new());
    app.registry()
        .resolve("SetName")
        .unwrap()
        .call(&ctx, &mut state, &Default::default(), "SetName")
        .await
        .unwrap();
    state.save().await.unwrap();

    let same_user = app.load_state(&message("conv-b", "")).await.unwrap();
    assert_eq!(
        same_user.get_value(USER_LAYER, "name").unwrap(),
        Some(&"Ada".into())
    );
    assert_eq!(lights_on(&same_user), None);

    let other_user = Activity::message("test", "conv-a", "user-2", "");
    let other = app.load_state(&other_user).await.unwrap();
    assert_eq!(other.get_value(USER_LAYER, "name").unwrap(), None);
}
