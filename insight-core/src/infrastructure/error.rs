// insight-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(insight::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(insight::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    // --- SERIES FILES / PAYLOADS ---
    #[error("JSON Error: {0}")]
    #[diagnostic(code(insight::infra::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(insight::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(insight::infra::config_missing))]
    ConfigNotFound(String),
}
