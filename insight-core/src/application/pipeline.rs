// insight-core/src/application/pipeline.rs

use chrono::NaiveDate;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::application::health::HealthMonitor;
use crate::application::outcome::PipelineOutcome;
use crate::application::reports::{Derivation, Payload};
use crate::application::request::{Endpoint, MAX_METRICS, PipelineRequest};
use crate::domain::analysis::threshold::ThresholdSet;
use crate::domain::demo::DemoGenerator;
use crate::domain::metrics::catalog::MetricCatalog;
use crate::domain::metrics::series::MetricSeries;
use crate::domain::project::{ProjectConfig, TtlSettings};
use crate::error::InsightError;
use crate::infrastructure::adapters::build_source;
use crate::infrastructure::cache::ResultCache;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::source::{SourceAdapter, SourceError};

/// Fetch → derive → cache, with demo data on every failure path.
/// One instance is shared by every request of the process.
pub struct AnalyticsPipeline {
    source: Arc<dyn SourceAdapter>,
    cache: Arc<ResultCache<Payload>>,
    clock: Arc<dyn Clock>,
    thresholds: ThresholdSet,
    catalog: MetricCatalog,
    ttl: TtlSettings,
    timeout: Duration,
    demo_seed: Option<u64>,
    health: Arc<HealthMonitor>,
}

/// What came back from the fan-out, in request order.
struct Fetched {
    series: Vec<MetricSeries>,
    failures: Vec<(String, SourceError)>,
}

impl Fetched {
    fn unavailable(&self) -> Vec<String> {
        self.failures.iter().map(|(m, _)| m.clone()).collect()
    }

    fn reason(&self) -> String {
        self.failures
            .iter()
            .map(|(_, e)| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn only_configuration_errors(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(|(_, e)| e.is_configuration())
    }
}

impl AnalyticsPipeline {
    /// Explicit wiring; tests inject their own source, cache and clock.
    pub fn new(
        source: Arc<dyn SourceAdapter>,
        cache: Arc<ResultCache<Payload>>,
        clock: Arc<dyn Clock>,
        config: &ProjectConfig,
    ) -> Result<Self, InsightError> {
        Ok(Self {
            source,
            cache,
            clock,
            thresholds: config.analysis.threshold_set()?,
            catalog: config.analysis.catalog(),
            ttl: config.cache.ttl.clone(),
            timeout: config.source.timeout(),
            demo_seed: config.demo.seed,
            health: Arc::new(HealthMonitor::new()),
        })
    }

    /// Production wiring: adapter from the `source:` section, wall clock.
    pub fn from_config(config: &ProjectConfig, project_dir: &Path) -> Result<Self, InsightError> {
        let source = build_source(project_dir, &config.source);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = Arc::new(ResultCache::new(
            config.cache.capacity,
            Endpoint::Overview.ttl(&config.cache.ttl),
            clock.clone(),
        ));
        info!(
            source = source.name(),
            configured = source.is_configured(),
            capacity = config.cache.capacity,
            "Pipeline ready"
        );
        Self::new(source, cache, clock, config)
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn cache(&self) -> &Arc<ResultCache<Payload>> {
        &self.cache
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Never fails. Degradation is carried by the outcome variant.
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint, refresh = request.force_refresh))]
    pub async fn run(&self, request: &PipelineRequest) -> PipelineOutcome {
        let outcome = self.run_stages(request).await;
        self.health.record(&outcome);
        outcome
    }

    async fn run_stages(&self, request: &PipelineRequest) -> PipelineOutcome {
        // 1. KeyBuild
        let key = request.cache_key();

        // 2. CacheCheck
        if let Some(hit) = self.cached(request, &key) {
            return hit;
        }

        // Single flight: concurrent misses on the same key wait here, then hit
        let _guard = self.cache.lock_key(&key).await;
        if let Some(hit) = self.cached(request, &key) {
            return hit;
        }

        // 3. ConfigGate
        if !self.source.is_configured() {
            let reason = format!("source '{}' is not configured", self.source.name());
            warn!(key = %key, "{}, serving demo data", reason);
            return PipelineOutcome::Unconfigured {
                payload: self.demo_payload(request, self.demo_seed),
                reason,
            };
        }

        // 4. Fetch
        let fetched = self.fetch_all(request).await;
        if let Some(outcome) = self.fallback_if_failed(request, &fetched) {
            return outcome;
        }

        // 5. Derive
        let derivation = Derivation::new(&self.catalog, &self.thresholds);
        let payload = derivation.derive(request, &fetched.series, fetched.unavailable());

        // 6. CacheStore, complete results only so a recovered metric shows up at once
        if fetched.failures.is_empty() {
            self.cache
                .set_with_ttl(key, payload.clone(), request.endpoint.ttl(&self.ttl));
        } else {
            debug!(key = %key, "partial result, not cached");
        }

        // 7. Respond
        PipelineOutcome::Fresh {
            payload,
            cached: false,
        }
    }

    fn cached(&self, request: &PipelineRequest, key: &str) -> Option<PipelineOutcome> {
        if request.force_refresh {
            return None;
        }
        let payload = self.cache.get(key)?;
        debug!(key, "cache hit");
        Some(PipelineOutcome::Fresh {
            payload,
            cached: true,
        })
    }

    /// Concurrent fetches, each bounded by the per-call timeout. A failing
    /// metric yields an empty series and never cancels its siblings.
    async fn fetch_all(&self, request: &PipelineRequest) -> Fetched {
        let range = request.range;
        let calls = request.metrics.iter().map(|metric| async move {
            let result = match tokio::time::timeout(self.timeout, self.source.fetch_series(metric, &range)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    metric: metric.clone(),
                    after: self.timeout,
                }),
            };
            (metric.clone(), result)
        });

        let results: Vec<(String, Result<MetricSeries, SourceError>)> =
            futures::stream::iter(calls).buffered(MAX_METRICS).collect().await;

        let mut fetched = Fetched {
            series: Vec::with_capacity(results.len()),
            failures: Vec::new(),
        };
        for (metric, result) in results {
            match result {
                Ok(series) => fetched.series.push(series),
                Err(e) => {
                    warn!(metric = %metric, error = %e, "fetch failed");
                    fetched.series.push(MetricSeries::empty(metric.clone()));
                    fetched.failures.push((metric, e));
                }
            }
        }
        fetched
    }

    /// The overview tolerates partial failure; the other views need every
    /// series, so any failure switches them to demo data.
    fn fallback_if_failed(&self, request: &PipelineRequest, fetched: &Fetched) -> Option<PipelineOutcome> {
        if fetched.failures.is_empty() {
            return None;
        }
        let tolerated = request.endpoint == Endpoint::Overview && fetched.failures.len() < request.metrics.len();
        if tolerated {
            return None;
        }

        let reason = fetched.reason();
        let payload = self.demo_payload(request, self.demo_seed);
        if fetched.only_configuration_errors() {
            warn!(reason = %reason, "source reported missing configuration, serving demo data");
            Some(PipelineOutcome::Unconfigured { payload, reason })
        } else {
            warn!(reason = %reason, "upstream failure, serving demo data");
            Some(PipelineOutcome::Degraded { payload, reason })
        }
    }

    /// Demo series for the requested metrics, derived exactly like real ones.
    pub fn demo_payload(&self, request: &PipelineRequest, seed: Option<u64>) -> Payload {
        let mut generator = DemoGenerator::new(seed);
        let series = generator.series_set(&request.metrics, &self.catalog, &request.range);
        Derivation::new(&self.catalog, &self.thresholds).derive(request, &series, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::range::{DateRange, parse_date};
    use crate::domain::metrics::series::DataPoint;
    use crate::domain::project::SourceKind;
    use crate::ports::clock::ManualClock;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HISTORY: [f64; 8] = [100.0, 110.0, 90.0, 105.0, 95.0, 108.0, 92.0, 130.0];

    /// In-memory source with per-metric behaviour and a call counter.
    #[derive(Default)]
    struct MockSource {
        values: HashMap<String, Vec<f64>>,
        failing: Vec<String>,
        slow: Vec<String>,
        unconfigured: bool,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn with(metrics: &[&str]) -> Self {
            Self {
                values: metrics
                    .iter()
                    .map(|m| (m.to_string(), HISTORY.to_vec()))
                    .collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceAdapter for MockSource {
        fn name(&self) -> &str {
            "mock"
        }

        fn is_configured(&self) -> bool {
            !self.unconfigured
        }

        async fn fetch_series(&self, metric: &str, range: &DateRange) -> Result<MetricSeries, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.slow.iter().any(|m| m == metric) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.iter().any(|m| m == metric) {
                return Err(SourceError::Upstream {
                    metric: metric.to_string(),
                    reason: "quota exceeded".into(),
                });
            }
            let values = self.values.get(metric).cloned().unwrap_or_default();
            let start = range.end_date - chrono::Duration::days(values.len() as i64 - 1);
            let points = values
                .into_iter()
                .enumerate()
                .map(|(i, v)| DataPoint::new(start + chrono::Duration::days(i as i64), v))
                .collect();
            Ok(MetricSeries::new(metric, points))
        }
    }

    struct Harness {
        pipeline: AnalyticsPipeline,
        source: Arc<MockSource>,
        clock: Arc<ManualClock>,
        config: ProjectConfig,
    }

    fn harness(source: MockSource) -> Result<Harness> {
        let mut config = ProjectConfig::standalone("test");
        config.source.kind = SourceKind::File;
        config.demo.seed = Some(7);
        let clock = Arc::new(ManualClock::new(parse_date("2024-03-31")?));
        let source = Arc::new(source);
        let cache = Arc::new(ResultCache::new(16, Duration::from_secs(300), clock.clone()));
        let pipeline = AnalyticsPipeline::new(source.clone(), cache, clock.clone(), &config)?;
        Ok(Harness {
            pipeline,
            source,
            clock,
            config,
        })
    }

    impl Harness {
        fn request(&self, endpoint: Endpoint, query: &str) -> PipelineRequest {
            PipelineRequest::from_query(endpoint, query, self.pipeline.today(), &self.config.analysis)
        }
    }

    #[tokio::test]
    async fn test_second_call_is_cached_with_identical_data() -> Result<()> {
        let h = harness(MockSource::with(&["sessions", "users"]))?;
        let request = h.request(Endpoint::Overview, "refresh=false&metrics=sessions,users");

        let first = h.pipeline.run(&request).await;
        let second = h.pipeline.run(&request).await;

        assert_eq!(first.kind(), "fresh");
        assert_eq!(second.kind(), "cached");
        assert_eq!(h.source.calls(), 2);

        let first = serde_json::to_string(&first.into_envelope().data())?;
        let second = serde_json::to_string(&second.into_envelope().data())?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_hit_and_rewrites_entry() -> Result<()> {
        let h = harness(MockSource::with(&["sessions"]))?;
        let normal = h.request(Endpoint::Anomalies, "metrics=sessions");
        let forced = h.request(Endpoint::Anomalies, "metrics=sessions&refresh=true");

        h.pipeline.run(&normal).await;
        let outcome = h.pipeline.run(&forced).await;
        assert_eq!(outcome.kind(), "fresh");
        assert_eq!(h.source.calls(), 2);

        // The forced run refreshed the shared entry
        assert!(h.pipeline.run(&normal).await.is_cached());
        assert_eq!(h.source.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_ttl_expiry_refetches() -> Result<()> {
        let h = harness(MockSource::with(&["sessions"]))?;
        let request = h.request(Endpoint::Trends, "metrics=sessions&weeks=2");

        h.pipeline.run(&request).await;
        h.clock.advance(Duration::from_secs(h.config.cache.ttl.trends));
        let outcome = h.pipeline.run(&request).await;

        assert_eq!(outcome.kind(), "fresh");
        assert_eq!(h.source.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_anomaly_is_flagged_from_real_data() -> Result<()> {
        let h = harness(MockSource::with(&["sessions"]))?;
        let request = h.request(Endpoint::Anomalies, "metrics=sessions");

        let outcome = h.pipeline.run(&request).await;
        let report = outcome
            .payload()
            .as_anomalies()
            .ok_or_else(|| anyhow::anyhow!("not an anomaly report"))?;
        assert_eq!(report.summary.critical, 1);
        assert_eq!(report.anomalies[0].z_score, 4.08);
        Ok(())
    }

    #[tokio::test]
    async fn test_unconfigured_source_skips_fetch() -> Result<()> {
        let h = harness(MockSource {
            unconfigured: true,
            ..MockSource::default()
        })?;
        let request = h.request(Endpoint::Overview, "metrics=sessions");

        let outcome = h.pipeline.run(&request).await;
        assert_eq!(outcome.kind(), "unconfigured");
        assert_eq!(h.source.calls(), 0);
        // Not cached: the next call checks the gate again
        assert!(h.pipeline.cache().is_empty());

        let json = serde_json::to_value(outcome.into_envelope())?;
        assert_eq!(json["demo"], true);
        Ok(())
    }

    #[tokio::test]
    async fn test_overview_isolates_failing_metric() -> Result<()> {
        let h = harness(MockSource {
            failing: vec!["users".into()],
            ..MockSource::with(&["sessions", "users"])
        })?;
        let request = h.request(Endpoint::Overview, "metrics=sessions,users");

        let outcome = h.pipeline.run(&request).await;
        assert_eq!(outcome.kind(), "fresh");
        let json = serde_json::to_value(outcome.into_envelope())?;
        assert_eq!(json["data"]["unavailable"][0], "users");
        assert_eq!(json["data"]["metrics"][0]["stats"]["sampleCount"], 8);
        assert_eq!(json["data"]["metrics"][1]["points"].as_array().map(Vec::len), Some(0));

        // Partial results are not cached
        assert!(h.pipeline.cache().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_total_failure_degrades_with_same_shape() -> Result<()> {
        let h = harness(MockSource {
            failing: vec!["sessions".into()],
            ..MockSource::with(&["sessions"])
        })?;
        let ok = harness(MockSource::with(&["sessions"]))?;

        for endpoint in Endpoint::ALL {
            let request = h.request(endpoint, "metrics=sessions");
            let degraded = h.pipeline.run(&request).await;
            let real = ok.pipeline.run(&request).await;

            assert_eq!(degraded.kind(), "degraded");
            let demo_json = serde_json::to_value(degraded.into_envelope())?;
            let real_json = serde_json::to_value(real.into_envelope())?;
            assert_eq!(demo_json["demo"], true);
            assert!(demo_json["message"].as_str().is_some_and(|m| m.contains("quota exceeded")));

            let keys = |v: &serde_json::Value| -> Vec<String> {
                v["data"]
                    .as_object()
                    .map(|o| o.keys().cloned().collect())
                    .unwrap_or_default()
            };
            assert_eq!(keys(&demo_json), keys(&real_json), "{} payload shape", endpoint);
        }
        assert_eq!(h.pipeline.health().snapshot().degraded, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_call_times_out_without_blocking_siblings() -> Result<()> {
        let mut h = harness(MockSource {
            slow: vec!["users".into()],
            ..MockSource::with(&["sessions", "users"])
        })?;
        h.pipeline.timeout = Duration::from_millis(50);
        let request = h.request(Endpoint::Overview, "metrics=sessions,users");

        let started = std::time::Instant::now();
        let outcome = h.pipeline.run(&request).await;
        assert!(started.elapsed() < Duration::from_secs(5));

        let json = serde_json::to_value(outcome.into_envelope())?;
        assert_eq!(json["cached"], false);
        assert_eq!(json["data"]["unavailable"][0], "users");
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() -> Result<()> {
        let h = harness(MockSource::with(&["sessions"]))?;
        let request = h.request(Endpoint::Overview, "metrics=sessions");

        let (a, b) = tokio::join!(h.pipeline.run(&request), h.pipeline.run(&request));
        assert_eq!(h.source.calls(), 1);
        assert!(a.is_cached() ^ b.is_cached());
        Ok(())
    }

    #[tokio::test]
    async fn test_demo_payload_is_deterministic_per_seed() -> Result<()> {
        let h = harness(MockSource::default())?;
        let request = h.request(Endpoint::Anomalies, "metrics=sessions,bounceRate");

        let a = h.pipeline.demo_payload(&request, Some(42));
        let b = h.pipeline.demo_payload(&request, Some(42));
        let c = h.pipeline.demo_payload(&request, Some(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
        // The synthetic spike always surfaces in the anomalies view
        assert!(a.as_anomalies().is_some_and(|r| !r.anomalies.is_empty()));
        Ok(())
    }
}
