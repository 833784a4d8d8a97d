use crate::core::state::{Entities, Value};
use crate::error::CommandError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

/// Discriminant carried in the `type` field of a command record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CommandType {
    Do,
    Say,
}

impl CommandType {
    fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("DO") {
            Some(Self::Do)
        } else if tag.eq_ignore_ascii_case("SAY") {
            Some(Self::Say)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictedDoCommand {
    pub action: String,
    pub entities: Entities,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedSayCommand {
    pub response: String,
}

/// One typed step of a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictedCommand {
    Do(PredictedDoCommand),
    Say(PredictedSayCommand),
}

impl PredictedCommand {
    pub fn action(action: impl Into<String>, entities: Entities) -> Self {
        Self::Do(PredictedDoCommand {
            action: action.into(),
            entities,
        })
    }

    pub fn say(response: impl Into<String>) -> Self {
        Self::Say(PredictedSayCommand {
            response: response.into(),
        })
    }

    pub fn command_type(&self) -> CommandType {
        match self {
            Self::Do(_) => CommandType::Do,
            Self::Say(_) => CommandType::Say,
        }
    }

    /// Action name for DO, `"SAY"` otherwise. Used in logs and errors.
    pub fn name(&self) -> &str {
        match self {
            Self::Do(command) => &command.action,
            Self::Say(_) => "SAY",
        }
    }

    /// Validate one raw planner record.
    ///
    /// DO requires a non-empty string `action` and an object `entities`;
    /// SAY requires a string `response`. The tag match is case-insensitive.
    pub fn parse(raw: &serde_json::Value) -> Result<Self, CommandError> {
        let record = raw.as_object().ok_or(CommandError::NotAnObject)?;

        let tag = match record.get("type") {
            None | Some(serde_json::Value::Null) => return Err(CommandError::MissingType),
            Some(serde_json::Value::String(tag)) => tag,
            Some(_) => {
                return Err(CommandError::InvalidField {
                    field: "type",
                    expected: "a string",
                });
            }
        };

        match CommandType::from_tag(tag) {
            Some(CommandType::Do) => parse_do(record),
            Some(CommandType::Say) => parse_say(record),
            None => Err(CommandError::UnknownType { tag: tag.clone() }),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Do(command) => {
                let entities: Map<String, serde_json::Value> = command
                    .entities
                    .iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::from(value.clone())))
                    .collect();
                json!({
                    "type": CommandType::Do,
                    "action": command.action,
                    "entities": entities,
                })
            }
            Self::Say(command) => json!({
                "type": CommandType::Say,
                "response": command.response,
            }),
        }
    }
}

fn parse_do(record: &Map<String, serde_json::Value>) -> Result<PredictedCommand, CommandError> {
    let action = match record.get("action") {
        None => return Err(CommandError::MissingField { field: "action" }),
        Some(serde_json::Value::String(action)) if !action.trim().is_empty() => action,
        Some(_) => {
            return Err(CommandError::InvalidField {
                field: "action",
                expected: "a non-empty string",
            });
        }
    };

    let entities = match record.get("entities") {
        None => return Err(CommandError::MissingField { field: "entities" }),
        Some(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(key, value)| (key.clone(), Value::from(value.clone())))
            .collect(),
        Some(_) => {
            return Err(CommandError::InvalidField {
                field: "entities",
                expected: "an object",
            });
        }
    };

    Ok(PredictedCommand::action(action.clone(), entities))
}

fn parse_say(record: &Map<String, serde_json::Value>) -> Result<PredictedCommand, CommandError> {
    match record.get("response") {
        None => Err(CommandError::MissingField { field: "response" }),
        Some(serde_json::Value::String(response)) => Ok(PredictedCommand::say(response.clone())),
        Some(_) => Err(CommandError::InvalidField {
            field: "response",
            expected: "a string",
        }),
    }
}
