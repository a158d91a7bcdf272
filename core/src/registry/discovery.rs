//! Evidence-file discovery.
//!
//! Files are visited one at a time in sorted path order so repeated runs
//! over the same tree resolve first-seen categories identically.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::PoisonError;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing::info;
use tracing::warn;
use walkdir::WalkDir;

use super::IntelligenceTypeRegistry;
use super::TypeUpdate;
use crate::category::infer_category;
use crate::naming::infer_type_name;
use crate::schema::infer_schema;

/// Statistics of one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub files_scanned: usize,
    /// Distinct type names sighted during the run.
    pub types_discovered: usize,
    /// Types that did not exist before the run.
    pub new_types: usize,
    pub errors: usize,
    /// Files that parsed but did not hold a JSON object.
    pub skipped_files: usize,
    #[serde(default)]
    pub error_details: Vec<DiscoveryError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryError {
    pub file: String,
    pub message: String,
}

/// Entry of the registry's discovery log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub timestamp: DateTime<Utc>,
    pub directory: String,
    pub stats: DiscoveryStats,
}

#[derive(Default)]
struct RunState {
    seen: BTreeSet<String>,
    new_types: usize,
}

impl IntelligenceTypeRegistry {
    /// Walk `dir` recursively and register every type found in `*.json` files.
    ///
    /// Never fails: unreadable or invalid files are logged and counted in
    /// `errors`, and a missing directory yields zeroed statistics.
    pub fn discover_from_directory(&self, dir: &Path) -> DiscoveryStats {
        let _run = self
            .discovery_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut stats = DiscoveryStats::default();

        if !dir.is_dir() {
            warn!(path = %dir.display(), "evidence directory does not exist");
            self.record_run(dir, &stats);
            return stats;
        }

        let mut run = RunState::default();
        let walker = WalkDir::new(dir)
            .follow_links(self.discovery.follow_links)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "failed to walk evidence directory");
                    let file = err
                        .path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default();
                    push_error(&mut stats, file, err.to_string());
                    continue;
                }
            };
            let path = entry.path();
            let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
            if !entry.file_type().is_file() || !is_json {
                continue;
            }
            stats.files_scanned += 1;
            let evidence = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            match load_evidence(path) {
                Ok(JsonValue::Object(map)) => {
                    self.scan_object(&map, None, 0, &evidence, &mut run);
                }
                Ok(_) => {
                    debug!(path = %path.display(), "skipping evidence file without a top-level object");
                    stats.skipped_files += 1;
                }
                Err(message) => {
                    warn!(path = %path.display(), error = %message, "failed to load evidence file");
                    push_error(&mut stats, evidence, message);
                }
            }
        }

        stats.types_discovered = run.seen.len();
        stats.new_types = run.new_types;
        info!(
            path = %dir.display(),
            files = stats.files_scanned,
            types = stats.types_discovered,
            new_types = stats.new_types,
            errors = stats.errors,
            "discovery finished"
        );
        self.record_run(dir, &stats);
        stats
    }

    fn scan_object(
        &self,
        map: &JsonMap<String, JsonValue>,
        parent: Option<&str>,
        depth: usize,
        evidence: &str,
        run: &mut RunState,
    ) {
        for (key, value) in map {
            if !is_discoverable(value) {
                continue;
            }
            let Some(name) = infer_type_name(key) else {
                continue;
            };
            let source_key = match parent {
                Some(parent) => format!("{parent}.{key}"),
                None => key.clone(),
            };
            let category = infer_category(key, value);
            let schema = infer_schema(value, self.schema.max_depth);
            let update =
                self.register_or_update_type(&name, category, &source_key, schema, evidence);
            if update == TypeUpdate::Created {
                run.new_types += 1;
            }
            run.seen.insert(name);

            if depth >= self.discovery.max_nesting_scan_depth {
                continue;
            }
            if let JsonValue::Object(child) = value {
                self.scan_object(child, Some(&source_key), depth + 1, evidence, run);
            }
        }
    }

    fn record_run(&self, dir: &Path, stats: &DiscoveryStats) {
        self.log().push(DiscoveryRecord {
            timestamp: Utc::now(),
            directory: dir.display().to_string(),
            stats: stats.clone(),
        });
    }
}

/// Keys holding an object, or an array of objects, describe a data shape.
fn is_discoverable(value: &JsonValue) -> bool {
    match value {
        JsonValue::Object(_) => true,
        JsonValue::Array(items) => matches!(items.first(), Some(JsonValue::Object(_))),
        _ => false,
    }
}

fn load_evidence(path: &Path) -> Result<JsonValue, String> {
    let contents = fs::read_to_string(path).map_err(|err| format!("read failed: {err}"))?;
    serde_json::from_str(&contents).map_err(|err| format!("invalid JSON: {err}"))
}

fn push_error(stats: &mut DiscoveryStats, file: String, message: String) {
    stats.errors += 1;
    stats.error_details.push(DiscoveryError { file, message });
}
