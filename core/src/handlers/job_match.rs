use anyhow::Result;
use anyhow::bail;
use serde_json::Value as JsonValue;
use serde_json::json;

use super::round1;
use super::skill_list;
use crate::handler::InferenceOptions;
use crate::handler::IntelligenceHandler;

const REQUIRED_WEIGHT: f64 = 80.0;
const PREFERRED_WEIGHT: f64 = 20.0;

/// Scores `profile.skills` against `job.required_skills` and
/// `job.preferred_skills` on a 0-100 scale.
pub struct JobMatchHandler;

impl IntelligenceHandler for JobMatchHandler {
    fn invoke(&self, payload: &JsonValue, _options: &InferenceOptions) -> Result<JsonValue> {
        let skills = skill_list(payload.pointer("/profile/skills"));
        let required = skill_list(payload.pointer("/job/required_skills"));
        let preferred = skill_list(payload.pointer("/job/preferred_skills"));
        if required.is_empty() {
            bail!("job.required_skills must list at least one skill");
        }

        let (matched, missing): (Vec<_>, Vec<_>) =
            required.iter().partition(|skill| skills.contains(skill));
        let preferred_matched: Vec<_> = preferred
            .iter()
            .filter(|skill| skills.contains(skill))
            .collect();

        let required_ratio = matched.len() as f64 / required.len() as f64;
        let score = if preferred.is_empty() {
            required_ratio * 100.0
        } else {
            let preferred_ratio = preferred_matched.len() as f64 / preferred.len() as f64;
            required_ratio * REQUIRED_WEIGHT + preferred_ratio * PREFERRED_WEIGHT
        };
        let recommendation = match score {
            s if s >= 75.0 => "strong",
            s if s >= 50.0 => "moderate",
            _ => "weak",
        };

        Ok(json!({
            "job_title": payload.pointer("/job/title").cloned().unwrap_or(JsonValue::Null),
            "match_score": round1(score),
            "matched_skills": matched,
            "missing_skills": missing,
            "preferred_matched": preferred_matched,
            "recommendation": recommendation,
        }))
    }
}
