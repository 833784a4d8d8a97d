use crate::app::{ApplicationBuilder, history_route};
use crate::cli::commands::{Cli, Commands, ConversationArgs, StateCommands};
use crate::config::Config;
use crate::core::history::tokenizer_for;
use crate::core::planner::{Plan, PredictedCommand, ReplayPlanner};
use crate::core::state::{CONVERSATION_LAYER, StateLoader, USER_LAYER};
use crate::core::storage::create_storage;
use crate::transport::{Activity, ConsoleOutbound};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn activity_for(target: &ConversationArgs, text: &str) -> Activity {
    Activity::message(&target.channel, &target.conversation, &target.user, text)
}

async fn state_loader(config: &Config) -> Result<StateLoader> {
    let storage = create_storage(&config.storage, &config.data_dir).await?;
    let mut loader = StateLoader::new(storage).with_history_limit(config.history.max_entries);
    if let Some(bot_id) = &config.bot_id {
        loader = loader.with_namespace(bot_id.clone());
    }
    Ok(loader)
}

fn describe(index: usize, command: &PredictedCommand) -> String {
    match command {
        PredictedCommand::Do(command) => {
            let entities = serde_json::to_string(&command.entities).unwrap_or_default();
            format!("{index:>3}  DO   {} {entities}", command.action)
        }
        PredictedCommand::Say(command) => format!("{index:>3}  SAY  {:?}", command.response),
    }
}

async fn validate_plan(path: &Path) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    let plan = Plan::from_json_str(&contents)?;

    println!("{}: {} command(s)", path.display(), plan.len());
    for (index, command) in plan.iter().enumerate() {
        println!("{}", describe(index, command));
    }
    Ok(())
}

/// Run one turn against configured storage with a recorded plan.
///
/// Only SAY commands and the built-in `/history` route do anything here; DO
/// commands surface `UnknownAction` because no actions are registered.
async fn replay(config: &Config, plan: &Path, target: &ConversationArgs, text: &str) -> Result<()> {
    let storage = create_storage(&config.storage, &config.data_dir).await?;
    let planner = ReplayPlanner::from_file(plan)
        .await
        .with_context(|| format!("Failed to read plan file {}", plan.display()))?;
    let tokenizer = tokenizer_for(&config.history.tokenizer)
        .context("history.tokenizer is not a known tokenizer")?;

    let app = ApplicationBuilder::from_config(config, storage, Arc::new(planner))
        .route(
            "/history",
            history_route(
                config.history.render_max_chars,
                Arc::from(tokenizer),
                config.history.separator.clone(),
            ),
        )?
        .build()?;

    let report = app
        .run_turn(activity_for(target, text), Arc::new(ConsoleOutbound::new("bot> ")))
        .await?;

    info!(
        turn_id = %report.turn_id,
        status = %report.status,
        outward = report.outward.len(),
        saved = report.saved.is_some(),
        "replay complete"
    );
    Ok(())
}

async fn show_state(config: &Config, target: &ConversationArgs) -> Result<()> {
    let loader = state_loader(config).await?;
    let state = loader.load(&activity_for(target, "")).await?;

    let snapshot = serde_json::json!({
        "conversation": state.conversation().values(),
        "user": state.user().values(),
        "history_entries": state.history().len(),
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn clear_state(config: &Config, target: &ConversationArgs, include_user: bool) -> Result<()> {
    let loader = state_loader(config).await?;
    let mut state = loader.load(&activity_for(target, "")).await?;

    state.delete_layer(CONVERSATION_LAYER)?;
    if include_user {
        state.delete_layer(USER_LAYER)?;
    }
    let report = state.save().await?;

    println!("Deleted {} record(s)", report.deleted.len());
    Ok(())
}

async fn show_history(
    config: &Config,
    target: &ConversationArgs,
    max_chars: Option<usize>,
) -> Result<()> {
    let loader = state_loader(config).await?;
    let state = loader.load(&activity_for(target, "")).await?;
    let tokenizer = tokenizer_for(&config.history.tokenizer)
        .context("history.tokenizer is not a known tokenizer")?;

    if state.history().is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    println!(
        "{}",
        state.history().render(
            max_chars.unwrap_or(config.history.render_max_chars),
            tokenizer.as_ref(),
            &config.history.separator,
        )
    );
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Validate { plan } => validate_plan(&plan).await,
        Commands::Replay { plan, target, text } => replay(&config, &plan, &target, &text).await,
        Commands::State { state_command } => match state_command {
            StateCommands::Show { target } => show_state(&config, &target).await,
            StateCommands::Clear {
                target,
                include_user,
            } => clear_state(&config, &target, include_user).await,
        },
        Commands::History { target, max_chars } => {
            show_history(&config, &target, max_chars).await
        }
    }
}
