use super::command::PredictedCommand;
use crate::error::PlanError;
use serde_json::json;

/// Ordered commands the planner wants executed this turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    commands: Vec<PredictedCommand>,
}

impl Plan {
    pub fn new(commands: Vec<PredictedCommand>) -> Self {
        Self { commands }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate raw planner output before anything executes.
    ///
    /// Accepts a bare array of command records or an object carrying a
    /// `commands` array (`{"type": "plan", "commands": [...]}`). The first
    /// bad record fails the whole plan with its index.
    pub fn parse(raw: &serde_json::Value) -> Result<Self, PlanError> {
        let records = match raw {
            serde_json::Value::Array(records) => records,
            serde_json::Value::Object(map) => match map.get("commands") {
                Some(serde_json::Value::Array(records)) => records,
                _ => return Err(PlanError::InvalidShape),
            },
            _ => return Err(PlanError::InvalidShape),
        };

        let commands = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                PredictedCommand::parse(record)
                    .map_err(|source| PlanError::MalformedCommand { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { commands })
    }

    pub fn from_json_str(text: &str) -> Result<Self, PlanError> {
        let raw: serde_json::Value = serde_json::from_str(text)?;
        Self::parse(&raw)
    }

    pub fn commands(&self) -> &[PredictedCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PredictedCommand> {
        self.commands.iter()
    }

    pub fn to_value(&self) -> serde_json::Value {
        let commands: Vec<serde_json::Value> =
            self.commands.iter().map(PredictedCommand::to_value).collect();
        json!({ "type": "plan", "commands": commands })
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a PredictedCommand;
    type IntoIter = std::slice::Iter<'a, PredictedCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
