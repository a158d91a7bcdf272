use anyhow::Result;
use anyhow::bail;
use serde_json::Value as JsonValue;
use serde_json::json;

use super::round1;
use super::skill_list;
use crate::handler::InferenceOptions;
use crate::handler::IntelligenceHandler;

const PRIORITY_GAPS: usize = 3;

/// Compares `current_skills` with `target_skills` (or `required_skills`).
///
/// Target skills are assumed to be listed most important first, so the
/// leading missing skills are reported as priority gaps.
pub struct SkillGapHandler;

impl IntelligenceHandler for SkillGapHandler {
    fn invoke(&self, payload: &JsonValue, _options: &InferenceOptions) -> Result<JsonValue> {
        let current = skill_list(payload.get("current_skills"));
        let target = skill_list(
            payload
                .get("target_skills")
                .or_else(|| payload.get("required_skills")),
        );
        if target.is_empty() {
            bail!("target_skills must list at least one skill");
        }

        let (strengths, missing): (Vec<_>, Vec<_>) =
            target.iter().partition(|skill| current.contains(skill));
        let additional: Vec<_> = current
            .iter()
            .filter(|skill| !target.contains(skill))
            .collect();
        let coverage = strengths.len() as f64 / target.len() as f64 * 100.0;

        Ok(json!({
            "target_role": payload.get("target_role").cloned().unwrap_or(JsonValue::Null),
            "missing_skills": missing,
            "strengths": strengths,
            "additional_skills": additional,
            "coverage_percentage": round1(coverage),
            "priority_gaps": missing.iter().take(PRIORITY_GAPS).collect::<Vec<_>>(),
        }))
    }
}
