use anyhow::Context;
use anyhow::Result;
use serde_json::Value as JsonValue;
use serde_json::json;

use super::option_bool;
use super::option_u64;
use super::skill_list;
use crate::handler::InferenceOptions;
use crate::handler::IntelligenceHandler;

const LEVELS: &[&str] = &["Junior", "Mid-level", "Senior", "Lead", "Principal"];
const DEFAULT_TIMEFRAME_YEARS: u64 = 5;
const MAX_TIMEFRAME_YEARS: u64 = 20;

/// Title keywords that pin the current level, highest level first.
const LEVEL_KEYWORDS: &[(&str, usize)] = &[
    ("principal", 4),
    ("director", 4),
    ("head", 4),
    ("lead", 3),
    ("staff", 3),
    ("senior", 2),
    ("sr", 2),
    ("mid", 1),
    ("junior", 0),
    ("jr", 0),
    ("intern", 0),
    ("graduate", 0),
];

/// Projects promotions along [`LEVELS`] for `timeframe_years`.
///
/// Broad skill sets (five or more skills) move up every two years,
/// otherwise every three.
pub struct CareerPathHandler;

impl IntelligenceHandler for CareerPathHandler {
    fn invoke(&self, payload: &JsonValue, options: &InferenceOptions) -> Result<JsonValue> {
        let profile = payload.get("profile").unwrap_or(payload);
        let role = profile
            .get("current_role")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .context("profile.current_role is required")?;
        let experience = profile
            .get("experience_years")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0)
            .max(0.0);
        let skills = skill_list(profile.get("skills"));
        let timeframe = option_u64(options, "timeframe_years")
            .unwrap_or(DEFAULT_TIMEFRAME_YEARS)
            .clamp(1, MAX_TIMEFRAME_YEARS);
        let include_reasoning = option_bool(options, "include_reasoning").unwrap_or(false);

        let (base_title, pinned) = split_title(role);
        let current_level = pinned.unwrap_or_else(|| level_from_experience(experience));
        let years_per_step: u64 = if skills.len() >= 5 { 2 } else { 3 };

        let mut path = Vec::new();
        let mut level = current_level;
        let mut year = years_per_step;
        while year <= timeframe && level + 1 < LEVELS.len() {
            level += 1;
            path.push(json!({"year": year, "role": titled(level, &base_title)}));
            year += years_per_step;
        }

        let confidence = ((0.9 - 0.1 * path.len() as f64).max(0.4) * 100.0).round() / 100.0;
        let mut result = json!({
            "current_role": role,
            "current_level": LEVELS[current_level],
            "timeframe_years": timeframe,
            "predicted_path": path,
            "confidence": confidence,
        });
        if include_reasoning {
            let level_basis = match pinned {
                Some(_) => format!("Current level taken from the title '{role}'."),
                None => format!("Current level inferred from {experience} years of experience."),
            };
            let cadence = format!(
                "{} skills listed, assuming a promotion every {years_per_step} years.",
                skills.len()
            );
            result["reasoning"] = json!([level_basis, cadence]);
        }
        Ok(result)
    }
}

/// Splits a title into its seniority-free base and the level its keywords pin.
fn split_title(role: &str) -> (String, Option<usize>) {
    let mut pinned = None;
    let mut base = Vec::new();
    for word in role.split_whitespace() {
        let lowered = word.trim_end_matches('.').to_lowercase();
        match LEVEL_KEYWORDS.iter().find(|(keyword, _)| *keyword == lowered) {
            Some((_, level)) => {
                pinned = Some(pinned.map_or(*level, |current: usize| current.max(*level)));
            }
            None => base.push(word),
        }
    }
    let base = if base.is_empty() {
        role.to_string()
    } else {
        base.join(" ")
    };
    (base, pinned)
}

fn level_from_experience(years: f64) -> usize {
    match years {
        y if y < 2.0 => 0,
        y if y < 5.0 => 1,
        y if y < 8.0 => 2,
        y if y < 12.0 => 3,
        _ => 4,
    }
}

fn titled(level: usize, base: &str) -> String {
    format!("{} {base}", LEVELS[level])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(timeframe: u64, reasoning: bool) -> InferenceOptions {
        let mut options = InferenceOptions::new();
        options.insert("timeframe_years".to_string(), json!(timeframe));
        options.insert("include_reasoning".to_string(), json!(reasoning));
        options
    }

    #[test]
    fn projects_promotions_within_timeframe() {
        let payload = json!({"profile": {"current_role": "Software Engineer", "experience_years": 4}});
        let result = CareerPathHandler
            .invoke(&payload, &options(6, false))
            .expect("result");
        assert_eq!(result["current_level"], json!("Mid-level"));
        assert_eq!(
            result["predicted_path"],
            json!([
                {"year": 3, "role": "Senior Software Engineer"},
                {"year": 6, "role": "Lead Software Engineer"}
            ])
        );
        assert_eq!(result["confidence"], json!(0.7));
        assert!(result.get("reasoning").is_none());
    }

    #[test]
    fn title_keywords_pin_the_level() {
        let payload = json!({
            "current_role": "Senior Data Analyst",
            "skills": ["sql", "python", "dbt", "airflow", "looker"]
        });
        let result = CareerPathHandler
            .invoke(&payload, &options(10, true))
            .expect("result");
        assert_eq!(result["current_level"], json!("Senior"));
        assert_eq!(
            result["predicted_path"],
            json!([
                {"year": 2, "role": "Lead Data Analyst"},
                {"year": 4, "role": "Principal Data Analyst"}
            ])
        );
        assert_eq!(result["reasoning"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn requires_current_role() {
        let err = CareerPathHandler
            .invoke(&json!({"profile": {}}), &InferenceOptions::new())
            .unwrap_err();
        assert!(format!("{err}").contains("current_role"));
    }
}
