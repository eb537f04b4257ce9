// insight-core/src/infrastructure/adapters/mod.rs

pub mod file;
pub mod gate;

pub use file::FileSeriesSource;
pub use gate::{CredentialGate, UnconfiguredSource};

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::domain::project::{SourceKind, SourceSettings};
use crate::ports::source::SourceAdapter;

/// Wires the adapter described by the `source:` section.
pub fn build_source(project_dir: &Path, settings: &SourceSettings) -> Arc<dyn SourceAdapter> {
    match settings.kind {
        SourceKind::None => {
            info!("No analytics source configured, serving demo data");
            Arc::new(UnconfiguredSource)
        }
        SourceKind::File => {
            let raw = Path::new(&settings.data_dir);
            let data_dir = if raw.is_absolute() {
                raw.to_path_buf()
            } else {
                project_dir.join(raw)
            };
            let source = FileSeriesSource::new(data_dir);

            if settings.required_env.is_empty() {
                Arc::new(source)
            } else {
                Arc::new(CredentialGate::new(source, settings.required_env.clone()))
            }
        }
    }
}
