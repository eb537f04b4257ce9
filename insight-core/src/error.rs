// insight-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    // --- DOMAIN ERRORS (thresholds, ranges, metric names) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, parsing, config) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- UPSTREAM ANALYTICS PROVIDERS ---
    #[error(transparent)]
    Source(#[from] SourceError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementation to avoid a duplicate enum variant but keep `?` ergonomics
impl From<std::io::Error> for InsightError {
    fn from(err: std::io::Error) -> Self {
        InsightError::Infrastructure(InfrastructureError::Io(err))
    }
}
