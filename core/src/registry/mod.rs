//! Process-wide catalog of intelligence types.
//!
//! The registry is built once (constructor injection, no globals) and shared
//! behind an `Arc`. The type table sits behind a single `RwLock`: discovery
//! and handler registration take the write side, lookups the read side.
//! Usage counters are atomics so a lookup never needs the write lock.
//! Entries are only ever added or updated in place, never removed.

mod discovery;
mod export;
mod report;
mod types;

pub use discovery::DiscoveryError;
pub use discovery::DiscoveryRecord;
pub use discovery::DiscoveryStats;
pub use export::RegistryExport;
pub use report::RegistryReport;
pub use types::CategoryStatus;
pub use types::ImplementationStatus;
pub use types::IntelligenceType;
pub use types::IntelligenceTypeInfo;
pub use types::TypeFilter;
pub use types::UsageStat;

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use tracing::debug;

use crate::category::UNCATEGORIZED;
use crate::config::DiscoveryConfig;
use crate::config::IntelConfig;
use crate::config::SchemaConfig;
use crate::handler::HandlerMetadata;
use crate::handler::Priority;
use crate::handler::SharedHandler;
use crate::schema::Schema;

/// Result of merging one sighting into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeUpdate {
    Created,
    Merged,
    Unchanged,
}

#[derive(Debug, Default)]
pub struct IntelligenceTypeRegistry {
    types: RwLock<BTreeMap<String, IntelligenceType>>,
    discovery_log: Mutex<Vec<DiscoveryRecord>>,
    /// Serialises whole discovery runs so file order decides first-seen categories.
    discovery_lock: Mutex<()>,
    schema: SchemaConfig,
    discovery: DiscoveryConfig,
}

impl IntelligenceTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &IntelConfig) -> Self {
        Self::with_settings(config.schema, config.discovery)
    }

    /// `schema.max_depth` is raised to at least 1.
    pub fn with_settings(schema: SchemaConfig, discovery: DiscoveryConfig) -> Self {
        let schema = SchemaConfig {
            max_depth: schema.max_depth.max(1),
        };
        Self {
            schema,
            discovery,
            ..Self::default()
        }
    }

    fn read_types(&self) -> RwLockReadGuard<'_, BTreeMap<String, IntelligenceType>> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_types(&self) -> RwLockWriteGuard<'_, BTreeMap<String, IntelligenceType>> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self) -> MutexGuard<'_, Vec<DiscoveryRecord>> {
        self.discovery_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge a sighting into an existing entry or create a new one.
    ///
    /// The category of the first sighting is kept; later sightings only add
    /// source keys, evidence files and schema fields (last write wins per
    /// field).
    pub(crate) fn register_or_update_type(
        &self,
        name: &str,
        category: &str,
        source_key: &str,
        schema: Schema,
        evidence_file: &str,
    ) -> TypeUpdate {
        let mut types = self.write_types();
        match types.get_mut(name) {
            Some(entry) => {
                if entry.category() != category {
                    debug!(
                        intelligence_type = name,
                        kept = entry.category(),
                        ignored = category,
                        "keeping first-seen category"
                    );
                }
                if entry.record_sighting(source_key, evidence_file, schema) {
                    TypeUpdate::Merged
                } else {
                    TypeUpdate::Unchanged
                }
            }
            None => {
                let mut entry = IntelligenceType::new(name, category);
                entry.record_sighting(source_key, evidence_file, schema);
                types.insert(name.to_string(), entry);
                debug!(intelligence_type = name, category, source_key, "registered new type");
                TypeUpdate::Created
            }
        }
    }

    /// Attach a handler; the last registration for a name wins.
    pub fn register_handler(
        &self,
        name: &str,
        handler: SharedHandler,
        priority: Priority,
        description: impl Into<String>,
    ) {
        self.register_handler_with(name, handler, HandlerMetadata::new(priority, description));
    }

    /// Like [`Self::register_handler`] with full metadata. Unknown names get
    /// a placeholder entry in the [`UNCATEGORIZED`] category.
    pub fn register_handler_with(
        &self,
        name: &str,
        handler: SharedHandler,
        metadata: HandlerMetadata,
    ) {
        let mut types = self.write_types();
        let entry = types
            .entry(name.to_string())
            .or_insert_with(|| IntelligenceType::new(name, UNCATEGORIZED));
        if entry.is_implemented() {
            debug!(intelligence_type = name, "replacing registered handler");
        }
        entry.attach_handler(handler, metadata);
    }

    /// Look up the handler for `name`.
    ///
    /// Every call on a known type bumps its usage counter, including calls
    /// that find no handler: the counter measures lookup attempts.
    pub fn get_handler(&self, name: &str) -> Option<SharedHandler> {
        self.read_types()
            .get(name)
            .and_then(IntelligenceType::lookup_handler)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_types().contains_key(name)
    }

    pub fn get_type_info(&self, name: &str) -> Option<IntelligenceTypeInfo> {
        self.read_types().get(name).map(IntelligenceType::to_info)
    }

    /// All type names in sorted order.
    pub fn type_names(&self) -> Vec<String> {
        self.read_types().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read_types().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list_types(&self, filter: &TypeFilter) -> Vec<IntelligenceTypeInfo> {
        self.read_types()
            .values()
            .filter(|entry| filter.matches(entry))
            .map(IntelligenceType::to_info)
            .collect()
    }

    /// Number of types per category.
    pub fn get_categories(&self) -> BTreeMap<String, usize> {
        let mut categories = BTreeMap::new();
        for entry in self.read_types().values() {
            *categories.entry(entry.category().to_string()).or_insert(0) += 1;
        }
        categories
    }

    pub fn get_implementation_status(&self) -> ImplementationStatus {
        let types = self.read_types();
        let total = types.len();
        let mut implemented = 0usize;
        let mut unimplemented_by_priority: BTreeMap<Priority, Vec<String>> = BTreeMap::new();
        let mut categories: BTreeMap<String, CategoryStatus> = BTreeMap::new();
        for entry in types.values() {
            let status = categories.entry(entry.category().to_string()).or_default();
            status.total += 1;
            if entry.is_implemented() {
                implemented += 1;
                status.implemented += 1;
            } else {
                unimplemented_by_priority
                    .entry(entry.priority())
                    .or_default()
                    .push(entry.name().to_string());
            }
        }
        let percentage_complete = if total == 0 {
            0.0
        } else {
            (implemented as f64 / total as f64 * 1000.0).round() / 10.0
        };
        ImplementationStatus {
            total,
            implemented,
            unimplemented: total - implemented,
            percentage_complete,
            unimplemented_by_priority,
            categories,
        }
    }

    /// The `top_n` most looked-up types, busiest first; ties sort by name.
    pub fn get_usage_stats(&self, top_n: usize) -> Vec<UsageStat> {
        let mut stats: Vec<UsageStat> = self
            .read_types()
            .values()
            .map(|entry| UsageStat {
                name: entry.name().to_string(),
                usage_count: entry.usage_count(),
                category: entry.category().to_string(),
                is_implemented: entry.is_implemented(),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        stats.truncate(top_n);
        stats
    }

    pub fn discovery_log(&self) -> Vec<DiscoveryRecord> {
        self.log().clone()
    }
}
