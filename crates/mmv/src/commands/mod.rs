//! CLI command implementations.

pub(crate) mod open;
pub(crate) mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Datelike;
use clap::Args;
use mmv_config::{CliSettings, Config};
use mmv_viewer::{ViewerConfig, encode_fragment, viewer_config_from_mmv_config};

use crate::error::CliError;

pub(crate) use open::OpenArgs;
pub(crate) use render::RenderArgs;

/// Options shared by every command: where manuals come from.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Path to configuration file (default: auto-discover mmv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raw-content root URL (overrides config).
    #[arg(long, env = "MMV_RAW_ROOT")]
    raw_root: Option<String>,

    /// Source branch (overrides config).
    #[arg(long)]
    branch: Option<String>,

    /// Manifest path relative to the raw-content root (overrides config).
    #[arg(long)]
    manifest: Option<String>,

    /// State file holding the theme preference (overrides config).
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Manual to open first, by path or URL.
    #[arg(long, conflicts_with = "fragment")]
    manual: Option<String>,

    /// Fragment to restore, as shared (`#manual=...`).
    #[arg(long)]
    fragment: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SourceArgs {
    /// Load configuration, prepare the project directory and build the
    /// viewer configuration.
    pub(crate) fn viewer_config(&self) -> Result<Arc<ViewerConfig>, CliError> {
        let cli_settings = CliSettings {
            raw_root: self.raw_root.clone(),
            branch: self.branch.clone(),
            manifest_path: self.manifest.clone(),
            state_file: self.state_file.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        ensure_project_dir(&config.state_resolved.project_dir)?;

        let year = chrono::Local::now().year();
        Ok(Arc::new(viewer_config_from_mmv_config(&config, year)))
    }

    /// Fragment naming the initial manual, if any.
    pub(crate) fn initial_fragment(&self) -> Option<String> {
        self.fragment
            .clone()
            .or_else(|| self.manual.as_deref().map(encode_fragment))
    }
}

/// Ensure the `.mmv/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir).map_err(|source| CliError::ProjectDir {
        path: project_dir.to_path_buf(),
        source,
    })?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by mmv\n*\n");
    }

    Ok(())
}
