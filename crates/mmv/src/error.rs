//! CLI error types.

use mmv_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create project directory {}: {source}", path.display())]
    ProjectDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
