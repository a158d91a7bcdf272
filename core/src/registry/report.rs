use std::fmt;

use intel_utils_string::truncate_chars;

use super::IntelligenceTypeRegistry;
use super::TypeFilter;

const TOP_USAGE: usize = 5;
const MAX_DESCRIPTION_CHARS: usize = 60;

/// Plain-text summary of implementation status, categories and usage.
pub struct RegistryReport<'a> {
    registry: &'a IntelligenceTypeRegistry,
}

impl IntelligenceTypeRegistry {
    pub fn report(&self) -> RegistryReport<'_> {
        RegistryReport { registry: self }
    }

    pub fn render_report(&self) -> String {
        self.report().to_string()
    }
}

impl fmt::Display for RegistryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry;
        let status = registry.get_implementation_status();
        writeln!(f, "Intelligence types: {}", status.total)?;
        writeln!(
            f,
            "Implemented: {} ({}%), unimplemented: {}",
            status.implemented, status.percentage_complete, status.unimplemented
        )?;

        writeln!(f, "\nCategories:")?;
        for (category, counts) in &status.categories {
            writeln!(
                f,
                "  {category}: {} types, {} implemented",
                counts.total, counts.implemented
            )?;
        }

        let implemented = registry.list_types(&TypeFilter::implemented());
        if !implemented.is_empty() {
            writeln!(f, "\nHandlers:")?;
            for info in implemented {
                writeln!(
                    f,
                    "  {} [{}] {}",
                    info.name,
                    info.priority,
                    truncate_chars(&info.description, MAX_DESCRIPTION_CHARS)
                )?;
            }
        }

        if !status.unimplemented_by_priority.is_empty() {
            writeln!(f, "\nAwaiting handlers:")?;
            for (priority, names) in &status.unimplemented_by_priority {
                writeln!(f, "  {priority}: {}", names.join(", "))?;
            }
        }

        let usage: Vec<_> = registry
            .get_usage_stats(TOP_USAGE)
            .into_iter()
            .filter(|stat| stat.usage_count > 0)
            .collect();
        if !usage.is_empty() {
            writeln!(f, "\nMost requested:")?;
            for stat in usage {
                writeln!(f, "  {}: {}", stat.name, stat.usage_count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::InferenceOptions;
    use crate::handler::Priority;
    use crate::handler::SharedHandler;
    use crate::schema::Schema;
    use serde_json::Value as JsonValue;
    use std::sync::Arc;

    #[test]
    fn report_mentions_status_handlers_and_usage() {
        let registry = IntelligenceTypeRegistry::new();
        registry.register_or_update_type("market_intelligence", "Markets", "m", Schema::new(), "f");
        let handler: SharedHandler = Arc::new(
            |payload: &JsonValue, _: &InferenceOptions| -> anyhow::Result<JsonValue> {
                Ok(payload.clone())
            },
        );
        registry.register_handler("job_match", handler, Priority::High, "Skill overlap");
        registry.get_handler("job_match");

        let report = registry.render_report();
        assert!(report.contains("Intelligence types: 2"));
        assert!(report.contains("Implemented: 1 (50%)"));
        assert!(report.contains("job_match [HIGH] Skill overlap"));
        assert!(report.contains("MEDIUM: market_intelligence"));
        assert!(report.contains("job_match: 1"));
    }
}
