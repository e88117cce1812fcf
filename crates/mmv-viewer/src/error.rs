//! Error types for loading manifests, documents and persisted state.

use std::path::PathBuf;

/// Error fetching a URL.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Request could not be completed (DNS, connection, body read).
    #[error("request to {url} failed: {source}")]
    Network {
        /// Requested URL.
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Error loading the manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestLoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Body is not a JSON array of entries.
    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Error loading a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentLoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Body is not valid UTF-8 text.
    #[error("document at {url} is not valid UTF-8 text")]
    Decode {
        /// Requested URL.
        url: String,
    },
}

/// Error reading or writing the persisted theme.
#[derive(Debug, thiserror::Error)]
pub enum ThemeStoreError {
    #[error("cannot access state file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid state file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = FetchError::Status {
            url: "https://raw.example.com/a.md".to_owned(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://raw.example.com/a.md");
    }

    #[test]
    fn test_manifest_fetch_error_is_transparent() {
        let err = ManifestLoadError::from(FetchError::Status {
            url: "u".to_owned(),
            status: 500,
        });
        assert_eq!(err.to_string(), "HTTP 500 for u");
    }
}
