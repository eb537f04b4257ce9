// insight-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod cache;
pub mod config;
pub mod error;
pub mod fs;
