// insight-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts the pipeline needs: SourceAdapter, Clock.
pub mod ports;

// 2. Domain (pure business rules)
// Series, statistics, severity, thresholds, demo data.
// Depends on NOTHING else (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// Cache, file-backed sources, credential gate, config files.
pub mod infrastructure;

// 4. Application (Use Cases)
// Pipeline orchestration, reports, request parsing, health side channel.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use insight_core::InsightError;
pub use error::InsightError;
