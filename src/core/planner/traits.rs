use super::parser::PlanParser;
use super::plan::Plan;
use crate::error::PlanError;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// Everything a planner sees when asked for the next plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub input: String,
    /// History rendered oldest first, already cut to the configured budget.
    pub history: String,
    pub channel_id: String,
    pub conversation_id: String,
    pub user_id: String,
    /// Registered action names, sorted.
    pub actions: Vec<String>,
}

/// Raw planner output: structured records, or model text still to be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerOutput {
    Records(serde_json::Value),
    Text(String),
}

impl PlannerOutput {
    pub fn into_plan(self) -> Result<Plan, PlanError> {
        match self {
            Self::Records(raw) => Plan::parse(&raw),
            Self::Text(text) => PlanParser::from_model_output(&text),
        }
    }
}

/// The model-facing collaborator that predicts a plan for one turn.
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    fn generate_plan<'a>(
        &'a self,
        prompt: &'a PromptContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<PlannerOutput>> + Send + 'a>>;
}

/// Returns the same recorded output for every turn.
#[derive(Debug, Clone)]
pub struct ReplayPlanner {
    output: PlannerOutput,
}

impl ReplayPlanner {
    pub fn new(output: PlannerOutput) -> Self {
        Self { output }
    }

    /// Load a plan file; JSON contents become records, anything else model text.
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let output = match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(raw) => PlannerOutput::Records(raw),
            Err(_) => PlannerOutput::Text(contents),
        };
        Ok(Self::new(output))
    }
}

impl Planner for ReplayPlanner {
    fn name(&self) -> &str {
        "replay"
    }

    fn generate_plan<'a>(
        &'a self,
        _prompt: &'a PromptContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<PlannerOutput>> + Send + 'a>> {
        Box::pin(async move { Ok(self.output.clone()) })
    }
}
