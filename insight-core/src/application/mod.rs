// insight-core/src/application/mod.rs

pub mod health;
pub mod outcome;
pub mod pipeline;
pub mod reports;
pub mod request;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI write `use insight_core::application::{AnalyticsPipeline, PipelineRequest};`
// without knowing the file layout.

pub use health::{HealthMonitor, HealthSnapshot};
pub use outcome::{Envelope, PipelineOutcome};
pub use pipeline::AnalyticsPipeline;
pub use reports::Payload;
pub use request::{Endpoint, PipelineRequest, split_target};
