//! Canonical intelligence-type names derived from evidence keys.
//!
//! Naming is heuristic on purpose: several source keys collapse onto the
//! same canonical name, which is how discovery consolidates sightings from
//! different evidence files into one registry entry.

use intel_utils_string::normalize_key;
use intel_utils_string::strip_non_empty_suffix;

/// Type names with built-in handlers or dedicated bridge entry points.
pub mod well_known {
    pub const CAREER_PATH: &str = "career_path";
    pub const JOB_MATCH: &str = "job_match";
    pub const SKILL_GAP_ANALYSIS: &str = "skill_gap_analysis";
    pub const SALARY_ANALYSIS: &str = "salary_analysis";
    pub const COMPANY_INTELLIGENCE: &str = "company_intelligence";
    pub const MARKET_INTELLIGENCE: &str = "market_intelligence";
    pub const PROFILE_ENRICHMENT: &str = "profile_enrichment";
    pub const TOUCHPOINT_ANALYSIS: &str = "touchpoint_analysis";
}

const INTELLIGENCE_SUFFIX: &str = "_intelligence";
const ANALYSIS_SUFFIX: &str = "_analysis";
const PROFILE_SUFFIX: &str = "_profile";

/// Bases of `*_intelligence` keys that map onto a different canonical type.
const INTELLIGENCE_EXCEPTIONS: &[(&str, &str)] = &[
    ("web_company", well_known::COMPANY_INTELLIGENCE),
    ("business", well_known::MARKET_INTELLIGENCE),
    ("industry", well_known::MARKET_INTELLIGENCE),
];

const KNOWN_SYNONYMS: &[(&str, &str)] = &[
    ("metadata", "metadata_tracking"),
    ("user_touchpoints", well_known::TOUCHPOINT_ANALYSIS),
    ("touchpoints", well_known::TOUCHPOINT_ANALYSIS),
    ("career_progression", well_known::CAREER_PATH),
    ("career_trajectory", well_known::CAREER_PATH),
    ("job_matches", well_known::JOB_MATCH),
    ("candidate_matches", well_known::JOB_MATCH),
    ("skill_gaps", well_known::SKILL_GAP_ANALYSIS),
    ("salary_data", well_known::SALARY_ANALYSIS),
];

/// A single naming rule, applied to an already normalised key.
pub struct NamingRule {
    pub id: &'static str,
    apply: fn(&str) -> Option<String>,
}

impl NamingRule {
    pub fn apply(&self, key: &str) -> Option<String> {
        (self.apply)(key)
    }
}

/// Ordered rule table; the first rule returning a name wins.
pub const NAMING_RULES: &[NamingRule] = &[
    NamingRule {
        id: "intelligence_suffix",
        apply: intelligence_suffix,
    },
    NamingRule {
        id: "analysis_suffix",
        apply: analysis_suffix,
    },
    NamingRule {
        id: "profile_suffix",
        apply: profile_suffix,
    },
    NamingRule {
        id: "known_synonym",
        apply: known_synonym,
    },
];

fn intelligence_suffix(key: &str) -> Option<String> {
    let base = strip_non_empty_suffix(key, INTELLIGENCE_SUFFIX)?;
    let name = INTELLIGENCE_EXCEPTIONS
        .iter()
        .find(|(exception, _)| *exception == base)
        .map(|(_, mapped)| (*mapped).to_string())
        .unwrap_or_else(|| format!("{base}{INTELLIGENCE_SUFFIX}"));
    Some(name)
}

fn analysis_suffix(key: &str) -> Option<String> {
    strip_non_empty_suffix(key, ANALYSIS_SUFFIX).map(|_| key.to_string())
}

fn profile_suffix(key: &str) -> Option<String> {
    strip_non_empty_suffix(key, PROFILE_SUFFIX).map(|_| format!("{key}{ANALYSIS_SUFFIX}"))
}

fn known_synonym(key: &str) -> Option<String> {
    KNOWN_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, name)| (*name).to_string())
}

/// Infer the canonical type name for an evidence key.
///
/// Total over non-empty keys; only the empty key has no name.
pub fn infer_type_name(key: &str) -> Option<String> {
    let normalized = normalize_key(key);
    if normalized.is_empty() {
        return None;
    }
    let name = NAMING_RULES
        .iter()
        .find_map(|rule| rule.apply(&normalized))
        .unwrap_or(normalized);
    Some(name)
}

/// Identifier of the rule that names `key`, or `"default"` when none matched.
pub fn matching_rule(key: &str) -> &'static str {
    let normalized = normalize_key(key);
    NAMING_RULES
        .iter()
        .find(|rule| rule.apply(&normalized).is_some())
        .map_or("default", |rule| rule.id)
}
