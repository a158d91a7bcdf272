//! Handler interface for implemented intelligence types.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Keyword arguments forwarded from the caller to a handler
/// (for example `timeframe_years` or `include_reasoning`).
pub type InferenceOptions = serde_json::Map<String, JsonValue>;

/// Computes a result for one intelligence type.
///
/// Errors and panics are contained by the dispatcher and turned into an
/// error outcome; they never reach the caller.
pub trait IntelligenceHandler: Send + Sync {
    fn invoke(&self, payload: &JsonValue, options: &InferenceOptions) -> Result<JsonValue>;
}

impl<F> IntelligenceHandler for F
where
    F: Fn(&JsonValue, &InferenceOptions) -> Result<JsonValue> + Send + Sync,
{
    fn invoke(&self, payload: &JsonValue, options: &InferenceOptions) -> Result<JsonValue> {
        self(payload, options)
    }
}

pub type SharedHandler = Arc<dyn IntelligenceHandler>;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{other}' (expected HIGH, MEDIUM or LOW)")),
        }
    }
}

/// Descriptive metadata attached when a handler is registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerMetadata {
    pub priority: Priority,
    pub description: String,
    pub examples: Vec<JsonValue>,
    pub related_types: Vec<String>,
}

impl HandlerMetadata {
    pub fn new(priority: Priority, description: impl Into<String>) -> Self {
        Self {
            priority,
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_example(mut self, example: JsonValue) -> Self {
        self.examples.push(example);
        self
    }

    pub fn with_related_type(mut self, name: impl Into<String>) -> Self {
        self.related_types.push(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn closures_are_handlers() {
        let handler: SharedHandler =
            Arc::new(|payload: &JsonValue, _: &InferenceOptions| -> Result<JsonValue> {
                Ok(json!({"echo": payload.clone()}))
            });
        let result = handler
            .invoke(&json!({"a": 1}), &InferenceOptions::new())
            .expect("invoke");
        assert_eq!(result, json!({"echo": {"a": 1}}));
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(Priority::default(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(serde_json::to_value(Priority::Low).expect("json"), json!("LOW"));
    }
}
