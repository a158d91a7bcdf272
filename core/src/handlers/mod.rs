//! Built-in handlers for the implemented intelligence types.
//!
//! Each handler computes from the request payload alone. Keyword options
//! (`timeframe_years`, `include_reasoning`, ...) arrive through
//! [`InferenceOptions`].

mod career_path;
mod job_match;
mod salary;
mod skill_gap;

pub use career_path::CareerPathHandler;
pub use job_match::JobMatchHandler;
pub use salary::SalaryAnalysisHandler;
pub use skill_gap::SkillGapHandler;

use std::sync::Arc;

use serde_json::Value as JsonValue;
use serde_json::json;

use crate::handler::HandlerMetadata;
use crate::handler::InferenceOptions;
use crate::handler::Priority;
use crate::naming::well_known;
use crate::registry::IntelligenceTypeRegistry;

/// Register the four built-in handlers with HIGH priority.
pub fn register_builtin_handlers(registry: &IntelligenceTypeRegistry) {
    registry.register_handler_with(
        well_known::CAREER_PATH,
        Arc::new(CareerPathHandler),
        HandlerMetadata::new(
            Priority::High,
            "Projects the next roles on a seniority ladder over a timeframe.",
        )
        .with_example(json!({"profile": {"current_role": "Software Engineer", "experience_years": 4}}))
        .with_related_type(well_known::SKILL_GAP_ANALYSIS),
    );
    registry.register_handler_with(
        well_known::JOB_MATCH,
        Arc::new(JobMatchHandler),
        HandlerMetadata::new(
            Priority::High,
            "Scores a profile against a job's required and preferred skills.",
        )
        .with_example(json!({
            "profile": {"skills": ["rust", "sql"]},
            "job": {"required_skills": ["rust"], "preferred_skills": ["kubernetes"]}
        }))
        .with_related_type(well_known::SKILL_GAP_ANALYSIS),
    );
    registry.register_handler_with(
        well_known::SKILL_GAP_ANALYSIS,
        Arc::new(SkillGapHandler),
        HandlerMetadata::new(
            Priority::High,
            "Compares current skills with the skills a target role needs.",
        )
        .with_example(json!({"current_skills": ["rust"], "target_skills": ["rust", "go"]}))
        .with_related_type(well_known::JOB_MATCH)
        .with_related_type(well_known::CAREER_PATH),
    );
    registry.register_handler_with(
        well_known::SALARY_ANALYSIS,
        Arc::new(SalaryAnalysisHandler),
        HandlerMetadata::new(
            Priority::High,
            "Positions a salary within a set of market salary samples.",
        )
        .with_example(json!({"salary_samples": [70000, 85000, 99000], "current_salary": 80000})),
    );
}

/// Normalised, de-duplicated skill names in input order.
fn skill_list(value: Option<&JsonValue>) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    let items = value.and_then(JsonValue::as_array).into_iter().flatten();
    for skill in items.filter_map(JsonValue::as_str) {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() && !skills.contains(&skill) {
            skills.push(skill);
        }
    }
    skills
}

fn option_u64(options: &InferenceOptions, key: &str) -> Option<u64> {
    options.get(key).and_then(JsonValue::as_u64)
}

fn option_bool(options: &InferenceOptions, key: &str) -> Option<bool> {
    options.get(key).and_then(JsonValue::as_bool)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeFilter;
    use pretty_assertions::assert_eq;

    #[test]
    fn registers_four_high_priority_handlers() {
        let registry = IntelligenceTypeRegistry::new();
        register_builtin_handlers(&registry);
        let names: Vec<_> = registry
            .list_types(&TypeFilter::implemented().with_priority(Priority::High))
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(
            names,
            vec!["career_path", "job_match", "salary_analysis", "skill_gap_analysis"]
        );
        let info = registry.get_type_info("skill_gap_analysis").expect("info");
        assert_eq!(info.related_types, vec!["job_match", "career_path"]);
        assert_eq!(info.examples.len(), 1);
    }

    #[test]
    fn skill_list_normalises_and_dedups() {
        let value = json!([" Rust", "rust", "SQL", 3, ""]);
        assert_eq!(skill_list(Some(&value)), vec!["rust", "sql"]);
        assert!(skill_list(None).is_empty());
    }
}
