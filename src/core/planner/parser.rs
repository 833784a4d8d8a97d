use super::command::PredictedCommand;
use super::plan::Plan;
use crate::error::PlanError;

/// Turns free-form model output into a [`Plan`].
pub struct PlanParser;

impl PlanParser {
    pub fn schema_prompt() -> &'static str {
        concat!(
            "Respond with a JSON plan in this exact format:\n",
            "{\n",
            "  \"type\": \"plan\",\n",
            "  \"commands\": [\n",
            "    { \"type\": \"DO\", \"action\": \"<action name>\", \"entities\": { ... } },\n",
            "    { \"type\": \"SAY\", \"response\": \"<text to send>\" }\n",
            "  ]\n",
            "}\n\n",
            "Commands run in order. Only use actions from the list of available actions.\n",
            "Use \"entities\": {} when an action takes no arguments.\n",
            "Wrap the JSON in a ```json code fence.",
        )
    }

    /// Parse model text. Text without a JSON payload becomes one SAY command.
    pub fn from_model_output(text: &str) -> Result<Plan, PlanError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Plan::empty());
        }

        if let Some(candidate) = Self::extract_json(trimmed)
            && let Ok(raw) = serde_json::from_str::<serde_json::Value>(candidate)
        {
            return Plan::parse(&raw);
        }

        tracing::debug!(
            chars = trimmed.chars().count(),
            "model output carried no JSON plan, treating it as a reply"
        );
        Ok(Plan::new(vec![PredictedCommand::say(trimmed)]))
    }

    /// Locate the JSON payload in `text`: a ```json fence first, then a bare
    /// fence holding a plan, then the first plan-shaped JSON value anywhere in
    /// the text. Openers that do not start valid JSON are skipped, so prose
    /// like `[lights]` ahead of the plan does not hide it.
    pub fn extract_json(text: &str) -> Option<&str> {
        if let Some(start) = text.find("```json") {
            let rest = &text[start + "```json".len()..];
            if let Some(end) = rest.find("```") {
                let candidate = rest[..end].trim();
                if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                    return Some(candidate);
                }
            }
        }

        if let Some(start) = text.find("```") {
            let rest = &text[start + "```".len()..];
            if let Some(end) = rest.find("```")
                && let Some(candidate) = leading_plan(rest[..end].trim())
            {
                return Some(candidate);
            }
        }

        text.match_indices(['{', '['])
            .find_map(|(open, _)| leading_plan(&text[open..]))
    }
}

/// An object, or an array of objects.
fn plan_shaped(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::Object(_) => true,
        serde_json::Value::Array(items) => items.iter().all(serde_json::Value::is_object),
        _ => false,
    }
}

/// The plan-shaped JSON value `text` starts with, ignoring what follows it.
fn leading_plan(text: &str) -> Option<&str> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<serde_json::Value>();
    match stream.next() {
        Some(Ok(raw)) if plan_shaped(&raw) => Some(&text[..stream.byte_offset()]),
        _ => None,
    }
}
