// insight-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{
    AnalysisSettings, CacheSettings, DemoSettings, ProjectConfig, SourceKind, SourceSettings,
    TtlSettings,
};
