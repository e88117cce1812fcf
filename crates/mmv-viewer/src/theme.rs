//! Theme preference and its durable storage.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::ThemeStoreError;

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "mmv-theme";

/// Color theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Theme for a stored value. Missing or unknown values mean light.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }
}

/// Durable storage for the theme preference.
pub trait ThemeStore {
    /// Stored value, if any.
    fn load(&self) -> Result<Option<String>, ThemeStoreError>;

    fn save(&self, value: &str) -> Result<(), ThemeStoreError>;
}

/// Theme preference kept under [`THEME_KEY`] in a JSON state file.
///
/// Other keys in the file are preserved.
#[derive(Clone, Debug)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> Result<Map<String, Value>, ThemeStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(ThemeStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content).map_err(|source| ThemeStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> Result<Option<String>, ThemeStoreError> {
        let state = self.read_state()?;
        Ok(state
            .get(THEME_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    fn save(&self, value: &str) -> Result<(), ThemeStoreError> {
        let mut state = self.read_state()?;
        state.insert(THEME_KEY.to_owned(), Value::String(value.to_owned()));

        let io_error = |source| ThemeStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(&state).map_err(|source| ThemeStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_error)?;
        tracing::debug!(path = %self.path.display(), theme = value, "Saved theme");
        Ok(())
    }
}

/// In-memory theme storage.
#[derive(Debug, Default)]
pub struct MemoryThemeStore {
    value: RefCell<Option<String>>,
}

impl MemoryThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `value`.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: RefCell::new(Some(value.to_owned())),
        }
    }
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self) -> Result<Option<String>, ThemeStoreError> {
        Ok(self.value.borrow().clone())
    }

    fn save(&self, value: &str) -> Result<(), ThemeStoreError> {
        *self.value.borrow_mut() = Some(value.to_owned());
        Ok(())
    }
}
