pub mod analysis;
pub mod demo;
pub mod error;
pub mod metrics;
pub mod project;

// Re-exports to keep imports short elsewhere
pub use error::DomainError;
