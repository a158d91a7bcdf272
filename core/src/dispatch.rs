//! Request routing over the registry.
//!
//! Every call lands in exactly one [`InferenceOutcome`] state, chosen only by
//! the requested name and the current registry contents. Nothing here
//! retries or propagates failures: handler errors and panics become
//! [`InferenceOutcome::Error`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_json::json;
use tracing::debug;
use tracing::error;

use crate::config::DispatchConfig;
use crate::handler::InferenceOptions;
use crate::handler::Priority;
use crate::handler::SharedHandler;
use crate::registry::IntelligenceTypeInfo;
use crate::registry::IntelligenceTypeRegistry;
use crate::schema::Schema;
use crate::schema::example_payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    NotImplemented,
    Unknown,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::NotImplemented => "not_implemented",
            OutcomeStatus::Unknown => "unknown",
            OutcomeStatus::Error => "error",
        }
    }
}

/// Stub answer for a discovered type that has no handler yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StubResponse {
    pub intelligence_type: String,
    pub message: String,
    pub schema: Schema,
    pub example_usage: JsonValue,
    pub priority: Priority,
    pub category: String,
    pub source_files: Vec<String>,
    pub hint: String,
}

/// Answer for a name the registry has never seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownType {
    pub intelligence_type: String,
    pub error: String,
    pub available_types: Vec<String>,
    pub total_types: usize,
    pub suggestions: Vec<String>,
    pub hint: String,
}

/// A handler returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerFailure {
    pub intelligence_type: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Success(JsonValue),
    NotImplemented(StubResponse),
    Unknown(UnknownType),
    Error(HandlerFailure),
}

impl InferenceOutcome {
    pub fn status(&self) -> OutcomeStatus {
        match self {
            InferenceOutcome::Success(_) => OutcomeStatus::Success,
            InferenceOutcome::NotImplemented(_) => OutcomeStatus::NotImplemented,
            InferenceOutcome::Unknown(_) => OutcomeStatus::Unknown,
            InferenceOutcome::Error(_) => OutcomeStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InferenceOutcome::Success(_))
    }

    /// JSON form of the outcome.
    ///
    /// Handler results pass through untouched (no `status` field); every
    /// other state is an object carrying `status`.
    pub fn to_value(&self) -> JsonValue {
        match self {
            InferenceOutcome::Success(value) => value.clone(),
            InferenceOutcome::NotImplemented(stub) => with_status(self.status(), stub),
            InferenceOutcome::Unknown(unknown) => with_status(self.status(), unknown),
            InferenceOutcome::Error(failure) => with_status(self.status(), failure),
        }
    }
}

fn with_status<T: Serialize>(status: OutcomeStatus, body: &T) -> JsonValue {
    let mut value = serde_json::to_value(body)
        .unwrap_or_else(|err| json!({"error": format!("failed to serialise outcome: {err}")}));
    if let JsonValue::Object(map) = &mut value {
        map.insert("status".to_string(), json!(status.as_str()));
    }
    value
}

pub struct Dispatcher {
    registry: Arc<IntelligenceTypeRegistry>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<IntelligenceTypeRegistry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &IntelligenceTypeRegistry {
        &self.registry
    }

    pub fn run_inference(
        &self,
        payload: &JsonValue,
        type_name: &str,
        options: &InferenceOptions,
    ) -> InferenceOutcome {
        if let Some(handler) = self.registry.get_handler(type_name) {
            debug!(intelligence_type = type_name, "dispatching to handler");
            return invoke_contained(&handler, type_name, payload, options);
        }
        match self.registry.get_type_info(type_name) {
            Some(info) => {
                debug!(intelligence_type = type_name, "type has no handler, returning stub");
                InferenceOutcome::NotImplemented(stub_response(info))
            }
            None => {
                debug!(intelligence_type = type_name, "unknown intelligence type");
                InferenceOutcome::Unknown(self.unknown_type(type_name))
            }
        }
    }

    fn unknown_type(&self, type_name: &str) -> UnknownType {
        let names = self.registry.type_names();
        let suggestions = nearest_names(
            type_name,
            &names,
            self.config.suggestion_threshold,
            self.config.suggestion_limit,
        );
        let hint = match suggestions.first() {
            Some(best) => format!("Did you mean '{best}'?"),
            None if names.is_empty() => {
                "The registry is empty; run discovery or register a handler first.".to_string()
            }
            None => format!(
                "Use list_types() to browse all {} known intelligence types.",
                names.len()
            ),
        };
        UnknownType {
            intelligence_type: type_name.to_string(),
            error: format!("Unknown intelligence type: {type_name}"),
            total_types: names.len(),
            available_types: names
                .into_iter()
                .take(self.config.available_types_limit)
                .collect(),
            suggestions,
            hint,
        }
    }
}

fn invoke_contained(
    handler: &SharedHandler,
    type_name: &str,
    payload: &JsonValue,
    options: &InferenceOptions,
) -> InferenceOutcome {
    let message = match catch_unwind(AssertUnwindSafe(|| handler.invoke(payload, options))) {
        Ok(Ok(value)) => return InferenceOutcome::Success(value),
        Ok(Err(err)) => {
            error!(intelligence_type = type_name, error = ?err, "handler failed");
            format!("{err:#}")
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(intelligence_type = type_name, panic = %message, "handler panicked");
            format!("handler panicked: {message}")
        }
    };
    InferenceOutcome::Error(HandlerFailure {
        intelligence_type: type_name.to_string(),
        error: message,
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn stub_response(info: IntelligenceTypeInfo) -> StubResponse {
    let name = info.name;
    let example_usage = json!({
        "call": format!("run_inference(data, \"{name}\")"),
        "data": example_payload(&info.schema),
    });
    StubResponse {
        message: format!(
            "Intelligence type '{name}' was discovered but has no handler registered yet."
        ),
        hint: format!(
            "Register a handler for '{name}' to return real results; the schema shows the discovered data shape."
        ),
        intelligence_type: name,
        schema: info.schema,
        example_usage,
        priority: info.priority,
        category: info.category,
        source_files: info.evidence_files.into_iter().collect(),
    }
}

/// Names similar to `query`, best match first.
fn nearest_names(query: &str, names: &[String], threshold: f64, limit: usize) -> Vec<String> {
    let query = query.to_lowercase();
    let mut scored: Vec<(f64, &String)> = names
        .iter()
        .map(|name| (strsim::jaro_winkler(&query, name), name))
        .filter(|(score, _)| *score >= threshold)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.clone())
        .collect()
}
