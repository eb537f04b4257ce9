// insight-core/src/application/health.rs
//
// Side channel for operators: response bodies hide degradation behind a
// `demo` flag, these counters do not.

use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::application::outcome::PipelineOutcome;

#[derive(Debug, Default)]
pub struct HealthMonitor {
    fresh: AtomicU64,
    cached: AtomicU64,
    degraded: AtomicU64,
    unconfigured: AtomicU64,
    serving_demo: AtomicBool,
    last_reason: Mutex<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub fresh: u64,
    pub cached: u64,
    pub degraded: u64,
    pub unconfigured: u64,
    /// Whether the most recent response was demo data.
    pub serving_demo: bool,
    pub last_degradation: Option<String>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &PipelineOutcome) {
        let reason = match outcome {
            PipelineOutcome::Fresh { cached: true, .. } => {
                self.cached.fetch_add(1, Ordering::Relaxed);
                None
            }
            PipelineOutcome::Fresh { cached: false, .. } => {
                self.fresh.fetch_add(1, Ordering::Relaxed);
                None
            }
            PipelineOutcome::Degraded { reason, .. } => {
                self.degraded.fetch_add(1, Ordering::Relaxed);
                Some(reason)
            }
            PipelineOutcome::Unconfigured { reason, .. } => {
                self.unconfigured.fetch_add(1, Ordering::Relaxed);
                Some(reason)
            }
        };

        self.serving_demo.store(outcome.is_demo(), Ordering::Relaxed);
        if let Some(reason) = reason {
            let mut last = match self.last_reason.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            *last = Some(reason.clone());
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last_degradation = match self.last_reason.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        HealthSnapshot {
            fresh: self.fresh.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            unconfigured: self.unconfigured.load(Ordering::Relaxed),
            serving_demo: self.serving_demo.load(Ordering::Relaxed),
            last_degradation,
        }
    }
}

impl HealthSnapshot {
    pub fn total(&self) -> u64 {
        self.fresh + self.cached + self.degraded + self.unconfigured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reports::{Payload, TrendReport};
    use crate::domain::metrics::range::DateRange;
    use anyhow::Result;

    fn payload() -> Result<Payload> {
        Ok(Payload::Trends(TrendReport {
            range: DateRange::parse("2024-03-04", "2024-03-31")?,
            weeks: 4,
            metrics: Vec::new(),
        }))
    }

    #[test]
    fn test_counts_and_last_reason() -> Result<()> {
        let monitor = HealthMonitor::new();
        monitor.record(&PipelineOutcome::Fresh {
            payload: payload()?,
            cached: false,
        });
        monitor.record(&PipelineOutcome::Degraded {
            payload: payload()?,
            reason: "upstream timeout".into(),
        });
        assert!(monitor.snapshot().serving_demo);

        monitor.record(&PipelineOutcome::Fresh {
            payload: payload()?,
            cached: true,
        });

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.fresh, 1);
        assert_eq!(snapshot.cached, 1);
        assert_eq!(snapshot.degraded, 1);
        assert_eq!(snapshot.total(), 3);
        // Recovered, but the last failure stays visible
        assert!(!snapshot.serving_demo);
        assert_eq!(snapshot.last_degradation.as_deref(), Some("upstream timeout"));
        Ok(())
    }
}
