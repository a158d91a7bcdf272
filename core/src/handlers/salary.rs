use anyhow::Result;
use anyhow::bail;
use serde_json::Value as JsonValue;
use serde_json::json;

use super::round1;
use crate::handler::InferenceOptions;
use crate::handler::IntelligenceHandler;

const DEFAULT_CURRENCY: &str = "USD";

/// Summarises `salary_samples` and, when `current_salary` is present,
/// places it relative to the inter-quartile range.
pub struct SalaryAnalysisHandler;

impl IntelligenceHandler for SalaryAnalysisHandler {
    fn invoke(&self, payload: &JsonValue, _options: &InferenceOptions) -> Result<JsonValue> {
        let Some(raw) = payload.get("salary_samples").and_then(JsonValue::as_array) else {
            bail!("salary_samples must be an array of numbers");
        };
        let mut samples = Vec::with_capacity(raw.len());
        for value in raw {
            match value.as_f64() {
                Some(sample) if sample.is_finite() && sample >= 0.0 => samples.push(sample),
                _ => bail!("salary_samples contains a non-numeric or negative value: {value}"),
            }
        }
        if samples.is_empty() {
            bail!("salary_samples must not be empty");
        }
        samples.sort_by(f64::total_cmp);

        let p25 = percentile(&samples, 0.25);
        let p75 = percentile(&samples, 0.75);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let mut result = json!({
            "currency": payload.get("currency").and_then(JsonValue::as_str).unwrap_or(DEFAULT_CURRENCY),
            "sample_size": samples.len(),
            "min": samples[0],
            "max": samples[samples.len() - 1],
            "mean": round1(mean),
            "median": percentile(&samples, 0.5),
            "p25": p25,
            "p75": p75,
        });

        if let Some(current) = payload.get("current_salary").and_then(JsonValue::as_f64) {
            let at_or_below = samples.iter().filter(|sample| **sample <= current).count();
            let position = if current < p25 {
                "below_market"
            } else if current > p75 {
                "above_market"
            } else {
                "within_market"
            };
            result["current_salary"] = json!(current);
            result["percentile_rank"] =
                json!(round1(at_or_below as f64 / samples.len() as f64 * 100.0));
            result["position"] = json!(position);
        }
        Ok(result)
    }
}

/// Linear interpolation between closest ranks over sorted samples.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let rank = fraction * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
