// insight-core/src/ports/source.rs

// What the pipeline needs from an analytics provider, without knowing which one.
// GA4, Search Console or a folder of JSON files all plug in behind this trait.

use async_trait::async_trait;
use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

use crate::domain::metrics::range::DateRange;
use crate::domain::metrics::series::MetricSeries;

#[derive(Error, Debug, Clone, Diagnostic)]
pub enum SourceError {
    /// Credentials or IDs are missing: go straight to demo data.
    #[error("Source '{source_name}' is not configured: {reason}")]
    #[diagnostic(
        code(insight::source::not_configured),
        help("Set the required environment variables or point 'data-dir' to an existing folder.")
    )]
    NotConfigured { source_name: String, reason: String },

    /// Network, auth or quota failure on the provider side.
    #[error("Upstream failure while fetching '{metric}': {reason}")]
    #[diagnostic(code(insight::source::upstream))]
    Upstream { metric: String, reason: String },

    /// The provider answered, but not with something we understand.
    #[error("Malformed upstream response for '{metric}': {reason}")]
    #[diagnostic(code(insight::source::malformed))]
    Malformed { metric: String, reason: String },

    #[error("Fetching '{metric}' timed out after {after:?}")]
    #[diagnostic(code(insight::source::timeout))]
    Timeout { metric: String, after: Duration },
}

impl SourceError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, SourceError::NotConfigured { .. })
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap check, no network. `false` routes the pipeline to demo data.
    fn is_configured(&self) -> bool;

    async fn fetch_series(&self, metric: &str, range: &DateRange) -> Result<MetricSeries, SourceError>;
}
