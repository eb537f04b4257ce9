// insight-core/src/infrastructure/adapters/gate.rs
//
// Config gate in front of a real source: without credentials the pipeline
// must not even attempt a fetch.

use async_trait::async_trait;

use crate::domain::metrics::range::DateRange;
use crate::domain::metrics::series::MetricSeries;
use crate::ports::source::{SourceAdapter, SourceError};

type EnvLookup = Box<dyn Fn(&str) -> bool + Send + Sync>;

pub struct CredentialGate<S> {
    inner: S,
    required: Vec<String>,
    is_set: EnvLookup,
}

impl<S: SourceAdapter> CredentialGate<S> {
    /// Checks the process environment; blank values count as missing.
    pub fn new(inner: S, required: Vec<String>) -> Self {
        Self::with_lookup(inner, required, |name| {
            std::env::var(name)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        })
    }

    pub fn with_lookup(
        inner: S,
        required: Vec<String>,
        is_set: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            required,
            is_set: Box::new(is_set),
        }
    }

    pub fn missing(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|name| !(self.is_set)(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[async_trait]
impl<S: SourceAdapter> SourceAdapter for CredentialGate<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_configured(&self) -> bool {
        self.missing().is_empty() && self.inner.is_configured()
    }

    async fn fetch_series(&self, metric: &str, range: &DateRange) -> Result<MetricSeries, SourceError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(SourceError::NotConfigured {
                source_name: self.name().to_string(),
                reason: format!("missing environment variables: {}", missing.join(", ")),
            });
        }
        self.inner.fetch_series(metric, range).await
    }
}

/// No upstream at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSource;

#[async_trait]
impl SourceAdapter for UnconfiguredSource {
    fn name(&self) -> &str {
        "none"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn fetch_series(&self, _metric: &str, _range: &DateRange) -> Result<MetricSeries, SourceError> {
        Err(SourceError::NotConfigured {
            source_name: self.name().to_string(),
            reason: "no analytics source configured".to_string(),
        })
    }
}
