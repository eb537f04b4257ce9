// insight-core/src/infrastructure/config/mod.rs

pub mod project;

pub use crate::domain::project::ProjectConfig;
pub use project::{find_main_config, load_project_config};
