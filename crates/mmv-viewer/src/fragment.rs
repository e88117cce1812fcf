//! `#manual=<identity>` fragment protocol.
//!
//! The identity is a same-origin path or an external URL, percent-encoded
//! with the same reserved set as `encodeURIComponent`.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

use crate::manifest::{DocumentSource, Manifest, ManifestEntry};
use crate::resolver::url_directory;

/// Characters escaped in a fragment value.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static MANUAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"manual=([^&]+)").unwrap());

static URL_SHAPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(https?:)?//").unwrap());

/// Fragment (with leading `#`) addressing `identity`.
pub fn encode_fragment(identity: &str) -> String {
    format!("#manual={}", utf8_percent_encode(identity, COMPONENT))
}

/// Extract the decoded identity from a fragment.
///
/// Accepts the fragment with or without the leading `#`.
pub fn parse_fragment(fragment: &str) -> Option<String> {
    let caps = MANUAL_RE.captures(fragment.trim_start_matches('#'))?;
    let decoded = percent_decode_str(&caps[1]).decode_utf8().ok()?;
    let key = decoded.trim();
    (!key.is_empty()).then(|| key.to_owned())
}

/// Entry for a restored key.
///
/// A manifest entry with the same path or URL wins. Otherwise a URL-shaped
/// key is an external document based at its own directory, and anything else
/// is a same-origin path. Protocol-relative keys are fetched over https.
pub fn restore_entry(key: &str, manifest: &Manifest) -> ManifestEntry {
    if let Some(entry) = manifest.find(key) {
        return entry.clone();
    }
    let source = if URL_SHAPED_RE.is_match(key) {
        let url = if key.starts_with("//") {
            format!("https:{key}")
        } else {
            key.to_owned()
        };
        let base = url_directory(&url).to_owned();
        DocumentSource::External {
            url,
            base: Some(base),
        }
    } else {
        DocumentSource::SameOrigin {
            path: key.to_owned(),
        }
    };
    ManifestEntry {
        title: None,
        source,
    }
}
