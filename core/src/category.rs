//! Keyword-driven category labels for intelligence types.

use intel_utils_string::normalize_key;
use serde_json::Value as JsonValue;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const COMPANY_AND_MARKET: &str = "Company & Market Intelligence";
pub const GENERAL_INTELLIGENCE: &str = "General Intelligence";

/// Maps a set of key keywords onto a category label.
pub struct CategoryRule {
    pub keywords: &'static [&'static str],
    pub category: &'static str,
    /// Narrower labels checked in order once one of `keywords` matched.
    pub refinements: &'static [(&'static [&'static str], &'static str)],
}

impl CategoryRule {
    /// Returns the label for `key` when the rule applies.
    pub fn classify(&self, key: &str) -> Option<&'static str> {
        if !contains_any(key, self.keywords) {
            return None;
        }
        let refined = self
            .refinements
            .iter()
            .find(|(keywords, _)| contains_any(key, keywords))
            .map(|(_, category)| *category);
        Some(refined.unwrap_or(self.category))
    }
}

fn contains_any(key: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| key.contains(keyword))
}

/// Ordered rule table; the first applicable rule wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: &["intelligence"],
        category: GENERAL_INTELLIGENCE,
        refinements: &[(
            &["company", "market", "business", "industry", "competitor"],
            COMPANY_AND_MARKET,
        )],
    },
    CategoryRule {
        keywords: &["profile", "candidate"],
        category: "Profile & Candidate Data",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["skill"],
        category: "Skills & Capabilities",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["location", "geography"],
        category: "Location & Geography",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["salary", "compensation"],
        category: "Compensation & Salary",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["job", "match", "compatibility"],
        category: "Job Matching & Compatibility",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["network", "connection"],
        category: "Networking & Connections",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["career"],
        category: "Career Development",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["touchpoint", "engagement", "journey"],
        category: "User Engagement & Touchpoints",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["ai", "confidence", "score"],
        category: "AI & Confidence Scoring",
        refinements: &[],
    },
    CategoryRule {
        keywords: &["education", "qualification"],
        category: "Education & Qualifications",
        refinements: &[],
    },
];

/// Infer a human-readable category for an evidence key.
///
/// Only the key is inspected; a `null` value is not worth classifying and
/// is reported as [`UNCATEGORIZED`].
pub fn infer_category(key: &str, value: &JsonValue) -> &'static str {
    if value.is_null() {
        return UNCATEGORIZED;
    }
    let key = normalize_key(key);
    CATEGORY_RULES
        .iter()
        .find_map(|rule| rule.classify(&key))
        .unwrap_or(UNCATEGORIZED)
}
