use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use serde::Serialize;

use super::PortalType;
use crate::dispatch::OutcomeStatus;

const MAX_LATENCY_SAMPLES: usize = 256;

/// Point-in-time view of [`BridgeMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BridgeMetricsSnapshot {
    pub total_requests: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_portal: BTreeMap<PortalType, u64>,
    pub by_status: BTreeMap<OutcomeStatus, u64>,
    pub latency_p95_ms: f64,
}

#[derive(Default)]
struct MetricsInner {
    total_requests: u64,
    by_type: BTreeMap<String, u64>,
    by_portal: BTreeMap<PortalType, u64>,
    by_status: BTreeMap<OutcomeStatus, u64>,
    latencies_ms: VecDeque<f64>,
}

impl MetricsInner {
    fn push_latency(&mut self, value_ms: f64) {
        if self.latencies_ms.len() >= MAX_LATENCY_SAMPLES {
            self.latencies_ms.pop_front();
        }
        self.latencies_ms.push_back(value_ms);
    }

    fn latency_p95(&self) -> f64 {
        if self.latencies_ms.is_empty() {
            return 0.0;
        }
        let mut samples: Vec<_> = self.latencies_ms.iter().copied().collect();
        samples.sort_by(f64::total_cmp);
        let idx = ((samples.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
        samples[idx]
    }
}

/// Request counters for one [`super::PortalBridge`].
#[derive(Default)]
pub struct BridgeMetrics {
    inner: Mutex<MetricsInner>,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        intelligence_type: &str,
        portal: PortalType,
        status: OutcomeStatus,
        elapsed: Duration,
    ) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.total_requests = inner.total_requests.saturating_add(1);
        bump(inner.by_type.entry(intelligence_type.to_string()).or_default());
        bump(inner.by_portal.entry(portal).or_default());
        bump(inner.by_status.entry(status).or_default());
        inner.push_latency(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn snapshot(&self) -> BridgeMetricsSnapshot {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        BridgeMetricsSnapshot {
            total_requests: inner.total_requests,
            by_type: inner.by_type.clone(),
            by_portal: inner.by_portal.clone(),
            by_status: inner.by_status.clone(),
            latency_p95_ms: inner.latency_p95(),
        }
    }
}

fn bump(counter: &mut u64) {
    *counter = counter.saturating_add(1);
}
