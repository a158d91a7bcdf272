use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use super::DiscoveryRecord;
use super::IntelligenceType;
use super::IntelligenceTypeInfo;
use super::IntelligenceTypeRegistry;
use crate::error::RegistryError;

/// On-disk shape written by [`IntelligenceTypeRegistry::export_registry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryExport {
    pub timestamp: DateTime<Utc>,
    pub total_types: usize,
    pub categories: BTreeMap<String, usize>,
    pub types: BTreeMap<String, IntelligenceTypeInfo>,
    #[serde(default)]
    pub discovery_log: Vec<DiscoveryRecord>,
}

impl IntelligenceTypeRegistry {
    pub fn snapshot(&self) -> RegistryExport {
        let types: BTreeMap<String, IntelligenceTypeInfo> = self
            .read_types()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.to_info()))
            .collect();
        RegistryExport {
            timestamp: Utc::now(),
            total_types: types.len(),
            categories: self.get_categories(),
            types,
            discovery_log: self.discovery_log(),
        }
    }

    /// Write the full registry state and discovery log as pretty JSON.
    pub fn export_registry(&self, path: &Path) -> Result<(), RegistryError> {
        let snapshot = self.snapshot();
        let data = serde_json::to_vec_pretty(&snapshot).map_err(RegistryError::Serialize)?;
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RegistryError::Export {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, data).map_err(|source| RegistryError::Export {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), types = snapshot.total_types, "exported registry");
        Ok(())
    }

    /// Rebuild entries from an export file and return how many were read.
    ///
    /// Existing entries keep their category and handler and absorb the
    /// imported source keys, evidence files and schema fields. Handlers and
    /// usage counts are never restored.
    pub fn import_registry(&self, path: &Path) -> Result<usize, RegistryError> {
        let data = fs::read(path).map_err(|source| RegistryError::Import {
            path: path.to_path_buf(),
            source,
        })?;
        let export: RegistryExport =
            serde_json::from_slice(&data).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let count = export.types.len();
        {
            let mut types = self.write_types();
            for (name, info) in export.types {
                match types.get_mut(&name) {
                    Some(entry) => entry.absorb(info),
                    None => {
                        types.insert(name, IntelligenceType::from_info(info));
                    }
                }
            }
        }
        self.log().extend(export.discovery_log);
        info!(path = %path.display(), types = count, "imported registry");
        Ok(count)
    }
}
