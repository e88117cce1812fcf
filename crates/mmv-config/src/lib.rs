//! Configuration management for the multi-manual viewer.
//!
//! Parses `mmv.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`]. The loaded
//! [`Config`] is validated once and then treated as immutable for the rest of
//! the session.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `source.owner`
//! - `source.repo`
//! - `source.branch`
//! - `source.raw_host`
//! - `source.raw_root`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the raw-content root URL.
    pub raw_root: Option<String>,
    /// Override the source branch.
    pub branch: Option<String>,
    /// Override the manifest path.
    pub manifest_path: Option<String>,
    /// Override the durable state file.
    pub state_file: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mmv.toml";

/// Name of the per-project data directory.
const PROJECT_DIR: &str = ".mmv";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where manuals and the manifest are fetched from.
    pub source: SourceConfig,
    /// Header, drawer and footer branding.
    pub branding: BrandingConfig,
    /// Markdown conversion options.
    pub render: RenderConfig,
    /// Durable client state (paths are relative strings from TOML).
    state: StateConfigRaw,

    /// Resolved state configuration (set after loading).
    #[serde(skip)]
    pub state_resolved: StateConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Source repository configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch the manuals are read from.
    pub branch: String,
    /// Host serving raw repository content.
    pub raw_host: String,
    /// Explicit raw-content root, replacing `raw_host/owner/repo/branch/`.
    pub raw_root: Option<String>,
    /// Manifest location relative to the raw-content root.
    pub manifest_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_owned(),
            raw_host: "https://raw.githubusercontent.com".to_owned(),
            raw_root: None,
            manifest_path: "data/manuals.json".to_owned(),
        }
    }
}

impl SourceConfig {
    /// Root URL that same-origin document paths are appended to.
    ///
    /// Always ends with `/`.
    #[must_use]
    pub fn raw_root(&self) -> String {
        let root = match &self.raw_root {
            Some(root) => root.clone(),
            None => format!(
                "{}/{}/{}/{}",
                self.raw_host.trim_end_matches('/'),
                self.owner,
                self.repo,
                self.branch
            ),
        };
        if root.ends_with('/') {
            root
        } else {
            format!("{root}/")
        }
    }

    /// Full URL of the manifest file.
    #[must_use]
    pub fn manifest_url(&self) -> String {
        format!(
            "{}{}",
            self.raw_root(),
            self.manifest_path.trim_start_matches('/')
        )
    }
}

/// Branding shown in the header, drawer and footer.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    /// Company name.
    pub company_name: String,
    /// Company logo source.
    pub company_logo: String,
    /// Partner logo source.
    pub partner_logo: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            company_name: "Your Company".to_owned(),
            company_logo: "images/company-logo.png".to_owned(),
            partner_logo: "images/partner-logo.png".to_owned(),
        }
    }
}

/// Markdown conversion options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enable GitHub Flavored Markdown.
    pub gfm: bool,
    /// Render soft line breaks as `<br>`.
    pub breaks: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            breaks: false,
        }
    }
}

/// Raw state configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StateConfigRaw {
    file: Option<String>,
}

/// Resolved durable state configuration with absolute paths.
#[derive(Debug, Default)]
pub struct StateConfig {
    /// Project directory for viewer data (.mmv/).
    pub project_dir: PathBuf,
    /// File holding persisted client state (theme preference).
    pub file: PathBuf,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`source.branch`").
        field: String,
        /// Error message (e.g., "${`MANUALS_BRANCH`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mmv.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// final result is validated, so a missing config file is fine as long as
    /// the CLI supplies a raw root.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(raw_root) = &settings.raw_root {
            self.source.raw_root = Some(raw_root.clone());
        }
        if let Some(branch) = &settings.branch {
            self.source.branch.clone_from(branch);
        }
        if let Some(manifest_path) = &settings.manifest_path {
            self.source.manifest_path.clone_from(manifest_path);
        }
        if let Some(state_file) = &settings.state_file {
            self.state_resolved.file.clone_from(state_file);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let project_dir = base.join(PROJECT_DIR);
        Self {
            source: SourceConfig::default(),
            branding: BrandingConfig::default(),
            render: RenderConfig::default(),
            state: StateConfigRaw::default(),
            state_resolved: StateConfig {
                file: project_dir.join("state.json"),
                project_dir,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_source()
    }

    /// Validate source configuration.
    fn validate_source(&self) -> Result<(), ConfigError> {
        let source = &self.source;
        if let Some(raw_root) = &source.raw_root {
            require_non_empty(raw_root, "source.raw_root")?;
            require_http_url(raw_root, "source.raw_root")?;
        } else {
            require_http_url(&source.raw_host, "source.raw_host")?;
            require_non_empty(&source.owner, "source.owner")?;
            require_non_empty(&source.repo, "source.repo")?;
            require_non_empty(&source.branch, "source.branch")?;
        }
        require_non_empty(&source.manifest_path, "source.manifest_path")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let source = &mut self.source;
        source.owner = expand::expand_env(&source.owner, "source.owner")?;
        source.repo = expand::expand_env(&source.repo, "source.repo")?;
        source.branch = expand::expand_env(&source.branch, "source.branch")?;
        source.raw_host = expand::expand_env(&source.raw_host, "source.raw_host")?;
        if let Some(ref raw_root) = source.raw_root {
            source.raw_root = Some(expand::expand_env(raw_root, "source.raw_root")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let project_dir = config_dir.join(PROJECT_DIR);
        let file = match &self.state.file {
            Some(file) => config_dir.join(file),
            None => project_dir.join("state.json"),
        };
        self.state_resolved = StateConfig { project_dir, file };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_source() -> SourceConfig {
        SourceConfig {
            owner: "acme".to_owned(),
            repo: "manuals".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.source.branch, "main");
        assert_eq!(config.source.manifest_path, "data/manuals.json");
        assert_eq!(config.branding.company_name, "Your Company");
        assert!(config.render.gfm);
        assert!(!config.render.breaks);
        assert_eq!(
            config.state_resolved.project_dir,
            PathBuf::from("/test/.mmv")
        );
        assert_eq!(
            config.state_resolved.file,
            PathBuf::from("/test/.mmv/state.json")
        );
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.source.raw_host, "https://raw.githubusercontent.com");
        assert!(config.source.raw_root.is_none());
    }

    #[test]
    fn test_parse_source_config() {
        let toml = r#"
[source]
owner = "acme"
repo = "manuals"
branch = "release"
manifest_path = "index.json"

[branding]
company_name = "Acme"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.source.owner, "acme");
        assert_eq!(config.source.repo, "manuals");
        assert_eq!(config.source.branch, "release");
        assert_eq!(config.branding.company_name, "Acme");
        assert_eq!(config.branding.partner_logo, "images/partner-logo.png");
    }

    #[test]
    fn test_raw_root_from_repository() {
        assert_eq!(
            sample_source().raw_root(),
            "https://raw.githubusercontent.com/acme/manuals/main/"
        );
    }

    #[test]
    fn test_raw_root_override_gets_trailing_slash() {
        let source = SourceConfig {
            raw_root: Some("https://cdn.example.com/docs".to_owned()),
            ..Default::default()
        };
        assert_eq!(source.raw_root(), "https://cdn.example.com/docs/");
    }

    #[test]
    fn test_manifest_url() {
        let mut source = sample_source();
        source.manifest_path = "/data/manuals.json".to_owned();
        assert_eq!(
            source.manifest_url(),
            "https://raw.githubusercontent.com/acme/manuals/main/data/manuals.json"
        );
    }

    #[test]
    fn test_validate_requires_owner_and_repo() {
        let config = Config::default_with_base(Path::new("/test"));
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("source.owner"));
    }

    #[test]
    fn test_validate_raw_root_skips_repository_fields() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.source.raw_root = Some("https://cdn.example.com/".to_owned());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_raw_root() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.source.raw_root = Some("ftp://cdn.example.com/".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source.raw_root"));
    }

    #[test]
    fn test_validate_rejects_empty_manifest_path() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.source = sample_source();
        config.source.manifest_path = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source.manifest_path"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            raw_root: Some("https://cdn.example.com/".to_owned()),
            branch: Some("next".to_owned()),
            manifest_path: None,
            state_file: Some(PathBuf::from("/tmp/state.json")),
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.source.raw_root.as_deref(),
            Some("https://cdn.example.com/")
        );
        assert_eq!(config.source.branch, "next");
        assert_eq!(config.source.manifest_path, "data/manuals.json"); // Unchanged
        assert_eq!(config.state_resolved.file, PathBuf::from("/tmp/state.json"));
    }

    #[test]
    fn test_resolve_state_file_relative_to_config() {
        let toml = r#"
[state]
file = "var/viewer.json"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(
            config.state_resolved.file,
            PathBuf::from("/project/var/viewer.json")
        );
        assert_eq!(
            config.state_resolved.project_dir,
            PathBuf::from("/project/.mmv")
        );
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mmv.toml");
        std::fs::write(
            &path,
            r#"
[source]
owner = "acme"
repo = "manuals"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(
            config.state_resolved.file,
            dir.path().join(".mmv").join("state.json")
        );
        assert_eq!(
            config.source.manifest_url(),
            "https://raw.githubusercontent.com/acme/manuals/main/data/manuals.json"
        );
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/mmv.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_expands_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MMV_TEST_BRANCH", "docs-v2");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mmv.toml");
        std::fs::write(
            &path,
            r#"
[source]
owner = "acme"
repo = "manuals"
branch = "${MMV_TEST_BRANCH}"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.source.branch, "docs-v2");
        unsafe {
            std::env::remove_var("MMV_TEST_BRANCH");
        }
    }
}
