// insight-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid threshold for '{metric}': {reason}")]
    #[diagnostic(
        code(insight::domain::threshold),
        help("criticalMultiplier must be >= warningMultiplier and both must be positive.")
    )]
    InvalidThreshold { metric: String, reason: String },

    #[error("Unknown endpoint '{0}'")]
    #[diagnostic(
        code(insight::domain::endpoint),
        help("Supported endpoints: overview, anomalies, trends.")
    )]
    UnknownEndpoint(String),

    #[error("Invalid metric name '{0}'")]
    #[diagnostic(
        code(insight::domain::metric_name),
        help("Metric names are alphanumeric identifiers such as 'sessions' or 'bounceRate'.")
    )]
    InvalidMetricName(String),

    #[error("Invalid date '{0}'")]
    #[diagnostic(code(insight::domain::date), help("Dates use the YYYY-MM-DD format."))]
    InvalidDate(String),
}
