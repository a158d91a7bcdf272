//! Portal-facing façade over the [`Dispatcher`].
//!
//! Every call is counted in [`BridgeMetrics`], routed through
//! [`Dispatcher::run_inference`], and stamped with a
//! `portal_bridge_metadata` block naming the type, portal and time.

mod metrics;

pub use metrics::BridgeMetrics;
pub use metrics::BridgeMetricsSnapshot;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_json::json;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::dispatch::InferenceOutcome;
use crate::dispatch::OutcomeStatus;
use crate::handler::InferenceOptions;
use crate::naming::well_known;

pub const METADATA_KEY: &str = "portal_bridge_metadata";

/// Which portal a request came from. Used for metrics and metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortalType {
    Admin,
    User,
}

impl PortalType {
    pub fn as_str(self) -> &'static str {
        match self {
            PortalType::Admin => "admin",
            PortalType::User => "user",
        }
    }
}

impl fmt::Display for PortalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortalType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(PortalType::Admin),
            "user" => Ok(PortalType::User),
            other => Err(format!("unknown portal '{other}' (expected admin or user)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeMetadata {
    pub intelligence_type: String,
    pub portal_type: PortalType,
    pub timestamp: DateTime<Utc>,
}

/// A dispatcher outcome plus the façade's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    outcome: InferenceOutcome,
    metadata: BridgeMetadata,
}

impl BridgeResponse {
    pub fn outcome(&self) -> &InferenceOutcome {
        &self.outcome
    }

    pub fn metadata(&self) -> &BridgeMetadata {
        &self.metadata
    }

    pub fn status(&self) -> OutcomeStatus {
        self.outcome.status()
    }

    pub fn into_outcome(self) -> InferenceOutcome {
        self.outcome
    }

    /// The outcome's JSON with `portal_bridge_metadata` attached.
    ///
    /// Handler results that are not objects are wrapped as `{"result": ...}`
    /// so the metadata always has a place to live.
    pub fn to_value(&self) -> JsonValue {
        let mut map = match self.outcome.to_value() {
            JsonValue::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        let metadata = serde_json::to_value(&self.metadata).unwrap_or_else(|_| {
            json!({
                "intelligence_type": self.metadata.intelligence_type,
                "portal_type": self.metadata.portal_type.as_str(),
            })
        });
        map.insert(METADATA_KEY.to_string(), metadata);
        JsonValue::Object(map)
    }
}

pub struct PortalBridge {
    dispatcher: Arc<Dispatcher>,
    metrics: BridgeMetrics,
}

impl PortalBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            metrics: BridgeMetrics::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> BridgeMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn get_intelligence(
        &self,
        intelligence_type: &str,
        data: &JsonValue,
        portal: PortalType,
        options: &InferenceOptions,
    ) -> BridgeResponse {
        let started = Instant::now();
        let outcome = self
            .dispatcher
            .run_inference(data, intelligence_type, options);
        let status = outcome.status();
        self.metrics
            .record(intelligence_type, portal, status, started.elapsed());
        info!(
            intelligence_type,
            portal = %portal,
            status = status.as_str(),
            "portal intelligence request"
        );
        BridgeResponse {
            outcome,
            metadata: BridgeMetadata {
                intelligence_type: intelligence_type.to_string(),
                portal_type: portal,
                timestamp: Utc::now(),
            },
        }
    }

    pub fn portal_career_path_prediction(
        &self,
        profile: JsonValue,
        timeframe_years: u64,
        portal: PortalType,
    ) -> BridgeResponse {
        let mut options = InferenceOptions::new();
        options.insert("timeframe_years".to_string(), json!(timeframe_years));
        self.get_intelligence(
            well_known::CAREER_PATH,
            &json!({ "profile": profile }),
            portal,
            &options,
        )
    }

    pub fn portal_job_matching(
        &self,
        profile: JsonValue,
        job: JsonValue,
        portal: PortalType,
    ) -> BridgeResponse {
        self.get_intelligence(
            well_known::JOB_MATCH,
            &json!({ "profile": profile, "job": job }),
            portal,
            &InferenceOptions::new(),
        )
    }

    pub fn portal_skill_gap_analysis(
        &self,
        current_skills: &[String],
        target_skills: &[String],
        portal: PortalType,
    ) -> BridgeResponse {
        self.get_intelligence(
            well_known::SKILL_GAP_ANALYSIS,
            &json!({ "current_skills": current_skills, "target_skills": target_skills }),
            portal,
            &InferenceOptions::new(),
        )
    }

    pub fn portal_salary_estimate(&self, data: &JsonValue, portal: PortalType) -> BridgeResponse {
        self.get_intelligence(
            well_known::SALARY_ANALYSIS,
            data,
            portal,
            &InferenceOptions::new(),
        )
    }

    pub fn portal_company_intelligence(
        &self,
        company: JsonValue,
        portal: PortalType,
    ) -> BridgeResponse {
        self.get_intelligence(
            well_known::COMPANY_INTELLIGENCE,
            &json!({ "company": company }),
            portal,
            &InferenceOptions::new(),
        )
    }

    pub fn portal_market_intelligence(&self, data: &JsonValue, portal: PortalType) -> BridgeResponse {
        self.get_intelligence(
            well_known::MARKET_INTELLIGENCE,
            data,
            portal,
            &InferenceOptions::new(),
        )
    }

    pub fn portal_profile_enrichment(
        &self,
        profile: JsonValue,
        portal: PortalType,
    ) -> BridgeResponse {
        self.get_intelligence(
            well_known::PROFILE_ENRICHMENT,
            &json!({ "profile": profile }),
            portal,
            &InferenceOptions::new(),
        )
    }

    pub fn portal_touchpoint_tracking(&self, data: &JsonValue, portal: PortalType) -> BridgeResponse {
        self.get_intelligence(
            well_known::TOUCHPOINT_ANALYSIS,
            data,
            portal,
            &InferenceOptions::new(),
        )
    }
}
