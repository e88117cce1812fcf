//! Manifest of browsable manuals.
//!
//! The manifest is a JSON array of objects with optional `title`, `path`,
//! `url` and `base` fields. Each record becomes a [`ManifestEntry`] whose
//! source is an explicit [`DocumentSource`] variant.

use serde::Deserialize;

use crate::error::ManifestLoadError;
use crate::fetch::Fetcher;
use crate::resolver::Origin;

/// Where a document lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentSource {
    /// Document in the viewer's own repository, relative to the raw-content root.
    SameOrigin { path: String },
    /// Document addressed by absolute URL, with an optional base directory
    /// for its own relative references.
    External { url: String, base: Option<String> },
}

/// A browsable document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub title: Option<String>,
    pub source: DocumentSource,
}

impl ManifestEntry {
    /// Entry for a same-origin path.
    pub fn same_origin(path: impl Into<String>) -> Self {
        Self {
            title: None,
            source: DocumentSource::SameOrigin { path: path.into() },
        }
    }

    /// Entry for an external URL.
    pub fn external(url: impl Into<String>, base: Option<String>) -> Self {
        Self {
            title: None,
            source: DocumentSource::External {
                url: url.into(),
                base,
            },
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The path or URL identifying the document.
    pub fn identity(&self) -> &str {
        match &self.source {
            DocumentSource::SameOrigin { path } => path,
            DocumentSource::External { url, .. } => url,
        }
    }

    /// Label for the index: the title, else the identity.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.identity())
    }

    /// URL the document text is fetched from.
    pub fn fetch_url(&self, raw_root: &str) -> String {
        match &self.source {
            DocumentSource::SameOrigin { path } => {
                format!("{raw_root}{}", path.trim_start_matches('/'))
            }
            DocumentSource::External { url, .. } => url.clone(),
        }
    }

    /// Origin used to resolve the document's relative references.
    ///
    /// External documents without a base have none: their relative
    /// references are left as written.
    pub fn origin(&self, raw_root: &str) -> Option<Origin> {
        match &self.source {
            DocumentSource::SameOrigin { path } => Some(Origin::same_origin(raw_root, path)),
            DocumentSource::External {
                base: Some(base), ..
            } => Some(Origin::external(base)),
            DocumentSource::External { base: None, .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    title: Option<String>,
    path: Option<String>,
    url: Option<String>,
    base: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ManifestRecord {
    fn into_entry(self) -> Option<ManifestEntry> {
        let title = non_empty(self.title);
        let source = match (non_empty(self.path), non_empty(self.url)) {
            (Some(path), _) => DocumentSource::SameOrigin { path },
            (None, Some(url)) => DocumentSource::External {
                url,
                base: non_empty(self.base),
            },
            (None, None) => return None,
        };
        Some(ManifestEntry { title, source })
    }
}

/// Ordered list of manuals; the first entry is the home document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Parse a manifest body.
    ///
    /// Records without `path` or `url` are skipped.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let records: Vec<ManifestRecord> = serde_json::from_slice(body)?;
        let total = records.len();
        let entries: Vec<_> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let entry = record.into_entry();
                if entry.is_none() {
                    tracing::warn!(index, "Skipping manifest entry without path or url");
                }
                entry
            })
            .collect();
        tracing::debug!(total, kept = entries.len(), "Parsed manifest");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ManifestEntry> {
        self.entries.get(index)
    }

    /// Home document.
    pub fn first(&self) -> Option<&ManifestEntry> {
        self.entries.first()
    }

    /// Find the entry whose path or URL equals `key`.
    pub fn find(&self, key: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|entry| entry.identity() == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index labels, one per entry.
    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.label().to_owned())
            .collect()
    }
}

/// Fetch and parse the manifest.
pub async fn load_manifest<F: Fetcher>(fetcher: &F, url: &str) -> Result<Manifest, ManifestLoadError> {
    tracing::info!(url, "Loading manifest");
    let body = fetcher.fetch(url).await?;
    Ok(Manifest::parse(&body)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const RAW_ROOT: &str = "https://raw.githubusercontent.com/acme/manuals/main/";

    #[test]
    fn test_parse_entries() {
        let manifest = Manifest::parse(
            br#"[
                {"title": "Home", "path": "docs/home.md"},
                {"title": "SDK", "url": "https://host/pkg/docs/readme.md", "base": "https://host/pkg/docs/"},
                {"url": "https://host/other.md"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            manifest.entries(),
            &[
                ManifestEntry::same_origin("docs/home.md").with_title("Home"),
                ManifestEntry::external(
                    "https://host/pkg/docs/readme.md",
                    Some("https://host/pkg/docs/".to_owned())
                )
                .with_title("SDK"),
                ManifestEntry::external("https://host/other.md", None),
            ]
        );
    }

    #[test]
    fn test_path_wins_over_url() {
        let manifest =
            Manifest::parse(br#"[{"path": "docs/a.md", "url": "https://host/b.md"}]"#).unwrap();
        assert_eq!(manifest.entries()[0].source, DocumentSource::SameOrigin {
            path: "docs/a.md".to_owned()
        });
    }

    #[test]
    fn test_entries_without_source_skipped() {
        let manifest =
            Manifest::parse(br#"[{"title": "Orphan"}, {"path": ""}, {"path": "a.md"}]"#).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].identity(), "a.md");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let manifest = Manifest::parse(br#"[{"path": "a.md", "icon": "book"}]"#).unwrap();
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(Manifest::parse(b"{\"path\": \"a.md\"}").is_err());
        assert!(Manifest::parse(b"not json").is_err());
    }

    #[test]
    fn test_labels_fall_back_to_identity() {
        let manifest = Manifest::parse(
            br#"[{"title": "Home", "path": "docs/home.md"}, {"title": "", "path": "docs/b.md"}, {"url": "https://x/c.md"}]"#,
        )
        .unwrap();
        assert_eq!(
            manifest.labels(),
            vec!["Home", "docs/b.md", "https://x/c.md"]
        );
    }

    #[test]
    fn test_find_by_path_or_url() {
        let manifest = Manifest::new(vec![
            ManifestEntry::same_origin("docs/home.md"),
            ManifestEntry::external("https://x/c.md", None),
        ]);
        assert!(manifest.find("docs/home.md").is_some());
        assert!(manifest.find("https://x/c.md").is_some());
        assert!(manifest.find("docs/missing.md").is_none());
    }

    #[test]
    fn test_fetch_url() {
        assert_eq!(
            ManifestEntry::same_origin("docs/home.md").fetch_url(RAW_ROOT),
            "https://raw.githubusercontent.com/acme/manuals/main/docs/home.md"
        );
        assert_eq!(
            ManifestEntry::external("https://host/readme.md", None).fetch_url(RAW_ROOT),
            "https://host/readme.md"
        );
    }

    #[test]
    fn test_origin_absent_for_external_without_base() {
        assert!(
            ManifestEntry::external("https://host/readme.md", None)
                .origin(RAW_ROOT)
                .is_none()
        );
        assert!(ManifestEntry::same_origin("a.md").origin(RAW_ROOT).is_some());
    }
}
