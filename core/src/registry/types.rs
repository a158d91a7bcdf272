use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::handler::HandlerMetadata;
use crate::handler::Priority;
use crate::handler::SharedHandler;
use crate::schema::Schema;
use crate::schema::merge_schema;

/// Registry entry for one intelligence type.
///
/// The entry is the only owner of its handler. `is_implemented` is derived
/// from the handler slot, so the two can never disagree.
pub struct IntelligenceType {
    name: String,
    category: String,
    source_keys: BTreeSet<String>,
    schema: Schema,
    evidence_files: BTreeSet<String>,
    priority: Priority,
    handler: Option<SharedHandler>,
    usage_count: AtomicU64,
    description: String,
    examples: Vec<JsonValue>,
    related_types: Vec<String>,
    first_seen: DateTime<Utc>,
}

impl IntelligenceType {
    pub(crate) fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            source_keys: BTreeSet::new(),
            schema: Schema::new(),
            evidence_files: BTreeSet::new(),
            priority: Priority::default(),
            handler: None,
            usage_count: AtomicU64::new(0),
            description: String::new(),
            examples: Vec::new(),
            related_types: Vec::new(),
            first_seen: Utc::now(),
        }
    }

    pub(crate) fn from_info(info: IntelligenceTypeInfo) -> Self {
        Self {
            name: info.name,
            category: info.category,
            source_keys: info.source_keys,
            schema: info.schema,
            evidence_files: info.evidence_files,
            priority: info.priority,
            handler: None,
            usage_count: AtomicU64::new(0),
            description: info.description,
            examples: info.examples,
            related_types: info.related_types,
            first_seen: info.first_seen,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_implemented(&self) -> bool {
        self.handler.is_some()
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count.load(Ordering::Relaxed)
    }

    /// Returns `true` when anything new was recorded.
    pub(crate) fn record_sighting(
        &mut self,
        source_key: &str,
        evidence_file: &str,
        schema: Schema,
    ) -> bool {
        let new_key = self.source_keys.insert(source_key.to_string());
        let new_file = self.evidence_files.insert(evidence_file.to_string());
        let schema_changed = schema
            .iter()
            .any(|(field, node)| self.schema.get(field) != Some(node));
        merge_schema(&mut self.schema, schema);
        new_key || new_file || schema_changed
    }

    /// Sightings from an imported export: sets are unioned, schema fields merged.
    pub(crate) fn absorb(&mut self, info: IntelligenceTypeInfo) {
        self.source_keys.extend(info.source_keys);
        self.evidence_files.extend(info.evidence_files);
        merge_schema(&mut self.schema, info.schema);
    }

    pub(crate) fn attach_handler(&mut self, handler: SharedHandler, metadata: HandlerMetadata) {
        self.handler = Some(handler);
        self.priority = metadata.priority;
        self.description = metadata.description;
        self.examples = metadata.examples;
        self.related_types = metadata.related_types;
    }

    /// Counts a lookup attempt and hands out the handler, if any.
    pub(crate) fn lookup_handler(&self) -> Option<SharedHandler> {
        self.usage_count.fetch_add(1, Ordering::Relaxed);
        self.handler.clone()
    }

    pub fn to_info(&self) -> IntelligenceTypeInfo {
        IntelligenceTypeInfo {
            name: self.name.clone(),
            category: self.category.clone(),
            source_keys: self.source_keys.clone(),
            schema: self.schema.clone(),
            evidence_files: self.evidence_files.clone(),
            priority: self.priority,
            is_implemented: self.is_implemented(),
            usage_count: self.usage_count(),
            description: self.description.clone(),
            examples: self.examples.clone(),
            related_types: self.related_types.clone(),
            first_seen: self.first_seen,
        }
    }
}

impl fmt::Debug for IntelligenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntelligenceType")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("priority", &self.priority)
            .field("is_implemented", &self.is_implemented())
            .field("usage_count", &self.usage_count())
            .field("source_keys", &self.source_keys.len())
            .finish()
    }
}

/// Serialisable snapshot of an [`IntelligenceType`]; this is the shape
/// used by `get_type_info`, `list_types` and the export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceTypeInfo {
    pub name: String,
    pub category: String,
    pub source_keys: BTreeSet<String>,
    pub schema: Schema,
    pub evidence_files: BTreeSet<String>,
    pub priority: Priority,
    pub is_implemented: bool,
    pub usage_count: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<JsonValue>,
    #[serde(default)]
    pub related_types: Vec<String>,
    pub first_seen: DateTime<Utc>,
}

/// Filters accepted by `list_types`. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilter {
    pub category: Option<String>,
    pub implemented_only: bool,
    pub priority: Option<Priority>,
}

impl TypeFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn implemented() -> Self {
        Self {
            implemented_only: true,
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub(crate) fn matches(&self, entry: &IntelligenceType) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| entry.category() == category);
        let priority_ok = self
            .priority
            .is_none_or(|priority| entry.priority() == priority);
        category_ok && priority_ok && (!self.implemented_only || entry.is_implemented())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStatus {
    pub total: usize,
    pub implemented: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationStatus {
    pub total: usize,
    pub implemented: usize,
    pub unimplemented: usize,
    pub percentage_complete: f64,
    pub unimplemented_by_priority: BTreeMap<Priority, Vec<String>>,
    pub categories: BTreeMap<String, CategoryStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    pub name: String,
    pub usage_count: u64,
    pub category: String,
    pub is_implemented: bool,
}
