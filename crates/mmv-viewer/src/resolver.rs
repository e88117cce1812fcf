//! Reference resolution for raw Markdown text.
//!
//! Rewrites link and image targets so every reference in a document can be
//! fetched on its own. Resolution rules:
//!
//! 1. Absolute URLs (any scheme, or `//host`) are left unchanged.
//! 2. Fragment references (`#section`) are left unchanged.
//! 3. Root-relative targets (`/x`) resolve against the root of the origin.
//! 4. Other relative targets resolve against the document's directory.
//!
//! `.` and `..` segments are normalized and never climb above the origin's
//! prefix (the raw-content root, or the scheme and host of an external base).
//! Rewriting is a text transform over Markdown syntax: link labels, image alt
//! text and everything outside link destinations is preserved byte for byte.
//! Fenced code blocks and inline code spans are left alone.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

static REFERENCE_DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^( {0,3}\[[^\]\n^][^\]\n]*\]:[ \t]*)(?:<([^>\n]*)>|(\S+))").unwrap()
});

/// Base against which a document's relative references resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    /// Fixed prefix, ending with `/`.
    prefix: String,
    /// Segments under the prefix that root-relative targets resolve against.
    root: Vec<String>,
    /// Segments of the document's directory.
    dir: Vec<String>,
}

/// Path segments with `.` and `..` folded away.
fn segments(path: &str) -> Vec<String> {
    let mut resolved = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            s => resolved.push(s.to_owned()),
        }
    }
    resolved
}

impl Origin {
    /// Origin of a same-origin document at `path` under `raw_root`.
    pub fn same_origin(raw_root: &str, path: &str) -> Self {
        let mut prefix = raw_root.to_owned();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        let path = strip_suffix(path);
        let dir = match path.rfind('/') {
            Some(i) => segments(&path[..i]),
            None => Vec::new(),
        };
        Self {
            prefix,
            root: Vec::new(),
            dir,
        }
    }

    /// Origin of an external document with an explicit `base`.
    ///
    /// The base denotes a directory whether or not it ends with `/`. Its root
    /// is the base with the final path segment removed.
    pub fn external(base: &str) -> Self {
        let base = strip_suffix(base);
        let host_start = base.find("//").map_or(0, |i| i + 2);
        let (prefix, path) = match base[host_start..].find('/') {
            Some(i) => base.split_at(host_start + i + 1),
            None => (base, ""),
        };
        let mut prefix = prefix.to_owned();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        let dir = segments(path);
        let root = dir[..dir.len().saturating_sub(1)].to_vec();
        Self { prefix, root, dir }
    }

    /// The directory URL (prefix plus directory segments, ending with `/`).
    pub fn directory(&self) -> String {
        self.join(&self.dir, "")
    }

    /// Resolve a single link or image target.
    pub fn resolve<'a>(&self, target: &'a str) -> Cow<'a, str> {
        if target.is_empty()
            || target.starts_with('#')
            || target.starts_with("//")
            || SCHEME_RE.is_match(target)
        {
            return Cow::Borrowed(target);
        }
        if let Some(rooted) = target.strip_prefix('/') {
            Cow::Owned(self.join(&self.root, rooted))
        } else {
            Cow::Owned(self.join(&self.dir, target))
        }
    }

    fn join(&self, base: &[String], target: &str) -> String {
        let split = target.find(['?', '#']).unwrap_or(target.len());
        let (path, suffix) = target.split_at(split);

        let mut resolved: Vec<&str> = base.iter().map(String::as_str).collect();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    resolved.pop();
                }
                s => resolved.push(s),
            }
        }

        let mut url = self.prefix.clone();
        url.push_str(&resolved.join("/"));
        let is_dir = path.is_empty()
            || path.ends_with('/')
            || path == "."
            || path == ".."
            || path.ends_with("/.")
            || path.ends_with("/..");
        if is_dir && !resolved.is_empty() {
            url.push('/');
        }
        url.push_str(suffix);
        url
    }
}

fn strip_suffix(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Directory of a URL: everything up to and including the last `/` of its path.
pub fn url_directory(url: &str) -> &str {
    let url = strip_suffix(url);
    let path_start = url.find("//").map_or(0, |i| i + 2);
    match url[path_start..].rfind('/') {
        Some(i) => &url[..path_start + i + 1],
        None => url,
    }
}

/// Rewrite every link, image and reference definition target in `text`.
pub fn rewrite_references(text: &str, origin: &Origin) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut prose = String::new();
    let mut fence: Option<(u8, usize)> = None;

    for line in text.split_inclusive('\n') {
        match fence {
            Some((marker, length)) => {
                out.push_str(line);
                if closes_fence(line, marker, length) {
                    fence = None;
                }
            }
            None => {
                if let Some(opened) = opens_fence(line) {
                    flush_prose(&mut prose, origin, &mut out);
                    out.push_str(line);
                    fence = Some(opened);
                } else {
                    prose.push_str(line);
                }
            }
        }
    }
    flush_prose(&mut prose, origin, &mut out);
    out
}

fn flush_prose(prose: &mut String, origin: &Origin, out: &mut String) {
    if prose.is_empty() {
        return;
    }
    let defined = REFERENCE_DEF_RE.replace_all(prose, |caps: &Captures<'_>| {
        let (target, bracketed) = match caps.get(2) {
            Some(m) => (m.as_str(), true),
            None => (caps.get(3).map_or("", |m| m.as_str()), false),
        };
        let resolved = origin.resolve(target);
        if bracketed {
            format!("{}<{resolved}>", &caps[1])
        } else {
            format!("{}{resolved}", &caps[1])
        }
    });
    rewrite_inline(&defined, origin, out);
    prose.clear();
}

/// Fence opening: up to three spaces, then at least three backticks or tildes.
fn opens_fence(line: &str) -> Option<(u8, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = *rest.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let length = rest.bytes().take_while(|&b| b == marker).count();
    if length < 3 {
        return None;
    }
    if marker == b'`' && rest[length..].contains('`') {
        return None;
    }
    Some((marker, length))
}

fn closes_fence(line: &str, marker: u8, length: usize) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    let run = rest.bytes().take_while(|&b| b == marker).count();
    run >= length && rest[run..].trim().is_empty()
}

/// Rewrite inline `[label](target)` and `![alt](target)` constructs.
fn rewrite_inline(text: &str, origin: &Origin, out: &mut String) {
    let bytes = text.as_bytes();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => i = skip_code_span(bytes, i),
            b'[' => {
                if let Some(link) = parse_link(text, i) {
                    out.push_str(&text[copied..=i]);
                    rewrite_inline(&text[i + 1..link.label_end], origin, out);
                    out.push_str(&text[link.label_end..link.dest_start]);
                    out.push_str(&origin.resolve(&text[link.dest_start..link.dest_end]));
                    copied = link.dest_end;
                    i = link.end;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    out.push_str(&text[copied.min(text.len())..]);
}

/// Byte offsets of an inline link.
struct InlineLink {
    /// Index of the closing `]`.
    label_end: usize,
    dest_start: usize,
    dest_end: usize,
    /// Index just past the closing `)`.
    end: usize,
}

fn skip_code_span(bytes: &[u8], start: usize) -> usize {
    let run = bytes[start..].iter().take_while(|&&b| b == b'`').count();
    let mut i = start + run;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let close = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            if close == run {
                return i + close;
            }
            i += close;
        } else {
            i += 1;
        }
    }
    start + run
}

fn parse_link(text: &str, open: usize) -> Option<InlineLink> {
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut i = open;
    let label_end = loop {
        match *bytes.get(i)? {
            b'\\' => i += 1,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    break i;
                }
            }
            _ => {}
        }
        i += 1;
    };

    if bytes.get(label_end + 1) != Some(&b'(') {
        return None;
    }
    i = skip_space(bytes, label_end + 2);

    let (dest_start, dest_end) = if bytes.get(i) == Some(&b'<') {
        let start = i + 1;
        let close = start + text[start..].find(['>', '\n'])?;
        if bytes[close] != b'>' {
            return None;
        }
        i = close + 1;
        (start, close)
    } else {
        let start = i;
        let mut parens = 0usize;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'\\' => i += 1,
                b'(' => parens += 1,
                b')' if parens == 0 => break,
                b')' => parens -= 1,
                b if b.is_ascii_whitespace() => break,
                _ => {}
            }
            i += 1;
        }
        (start, i.min(bytes.len()))
    };

    i = skip_space(bytes, i);
    if let Some(&quote) = bytes.get(i)
        && matches!(quote, b'"' | b'\'' | b'(')
    {
        let closing = if quote == b'(' { b')' } else { quote };
        i += 1;
        while *bytes.get(i)? != closing {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        i = skip_space(bytes, i + 1);
    }

    (bytes.get(i) == Some(&b')')).then_some(InlineLink {
        label_end,
        dest_start,
        dest_end,
        end: i + 1,
    })
}

fn skip_space(bytes: &[u8], mut i: usize) -> usize {
    let mut newlines = 0;
    while let Some(&b) = bytes.get(i) {
        match b {
            b' ' | b'\t' => {}
            b'\n' if newlines == 0 => newlines += 1,
            _ => break,
        }
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ROOT: &str = "https://raw.githubusercontent.com/acme/manuals/main/";

    fn same_origin(path: &str) -> Origin {
        Origin::same_origin(ROOT, path)
    }

    #[test]
    fn test_directory_relative() {
        let origin = same_origin("docs/guide/index.md");
        assert_eq!(
            origin.resolve("setup.md"),
            format!("{ROOT}docs/guide/setup.md")
        );
    }

    #[test]
    fn test_parent_segments_normalized() {
        let origin = same_origin("docs/home.md");
        assert_eq!(
            origin.resolve("../images/a.png"),
            format!("{ROOT}images/a.png")
        );
        assert_eq!(
            origin.resolve("./img/../b.png"),
            format!("{ROOT}docs/b.png")
        );
    }

    #[test]
    fn test_parent_segments_clamped_at_root() {
        let origin = same_origin("home.md");
        assert_eq!(origin.resolve("../../a.png"), format!("{ROOT}a.png"));
    }

    #[test]
    fn test_document_path_segments_normalized() {
        let origin = same_origin("./docs/guide/../home.md");
        assert_eq!(origin.resolve("x.png"), format!("{ROOT}docs/x.png"));
        assert_eq!(origin.directory(), format!("{ROOT}docs/"));
    }

    #[test]
    fn test_root_relative_same_origin() {
        let origin = same_origin("docs/guide/index.md");
        assert_eq!(
            origin.resolve("/images/logo.png"),
            format!("{ROOT}images/logo.png")
        );
    }

    #[test]
    fn test_absolute_and_fragment_unchanged() {
        let origin = same_origin("docs/home.md");
        for target in [
            "https://example.com/a.md",
            "HTTP://example.com/a.md",
            "//cdn.example.com/a.png",
            "#install",
            "mailto:docs@example.com",
            "",
        ] {
            assert!(matches!(origin.resolve(target), Cow::Borrowed(t) if t == target));
        }
    }

    #[test]
    fn test_query_and_fragment_kept() {
        let origin = same_origin("docs/home.md");
        assert_eq!(
            origin.resolve("setup.md#install"),
            format!("{ROOT}docs/setup.md#install")
        );
        assert_eq!(
            origin.resolve("a.png?raw=true"),
            format!("{ROOT}docs/a.png?raw=true")
        );
    }

    #[test]
    fn test_trailing_slash_kept() {
        let origin = same_origin("docs/home.md");
        assert_eq!(origin.resolve("api/"), format!("{ROOT}docs/api/"));
        assert_eq!(origin.resolve(".."), ROOT);
    }

    #[test]
    fn test_external_base() {
        let origin = Origin::external("https://host/pkg/docs/");
        assert_eq!(origin.resolve("install.md"), "https://host/pkg/docs/install.md");
        assert_eq!(origin.resolve("/LICENSE"), "https://host/pkg/LICENSE");
        assert_eq!(origin.directory(), "https://host/pkg/docs/");
    }

    #[test]
    fn test_external_base_without_trailing_slash() {
        let origin = Origin::external("https://host/pkg/docs");
        assert_eq!(origin.resolve("install.md"), "https://host/pkg/docs/install.md");
    }

    #[test]
    fn test_external_base_segments_normalized() {
        let origin = Origin::external("https://host/pkg/./docs/../guide/");
        assert_eq!(origin.resolve("a.md"), "https://host/pkg/guide/a.md");
    }

    #[test]
    fn test_external_base_at_host_root() {
        let origin = Origin::external("https://host");
        assert_eq!(origin.resolve("a.md"), "https://host/a.md");
        assert_eq!(origin.resolve("/b.md"), "https://host/b.md");
        assert_eq!(origin.resolve("../c.md"), "https://host/c.md");
    }

    #[test]
    fn test_url_directory() {
        assert_eq!(
            url_directory("https://host/pkg/docs/readme.md"),
            "https://host/pkg/docs/"
        );
        assert_eq!(
            url_directory("https://host/pkg/readme.md#intro"),
            "https://host/pkg/"
        );
        assert_eq!(url_directory("https://host"), "https://host");
    }

    #[test]
    fn test_rewrite_links_and_images() {
        let origin = same_origin("docs/home.md");
        let text = "See [setup](setup.md) and ![diagram](img/d.png \"Flow\").";
        assert_eq!(
            rewrite_references(text, &origin),
            format!("See [setup]({ROOT}docs/setup.md) and ![diagram]({ROOT}docs/img/d.png \"Flow\").")
        );
    }

    #[test]
    fn test_rewrite_preserves_labels() {
        let origin = same_origin("docs/home.md");
        let text = "[a.md](a.md) [**b**](b.md) [c (d)](e.md)";
        assert_eq!(
            rewrite_references(text, &origin),
            format!("[a.md]({ROOT}docs/a.md) [**b**]({ROOT}docs/b.md) [c (d)]({ROOT}docs/e.md)")
        );
    }

    #[test]
    fn test_rewrite_image_inside_link() {
        let origin = same_origin("docs/home.md");
        let text = "[![badge](badge.svg)](status.md)";
        assert_eq!(
            rewrite_references(text, &origin),
            format!("[![badge]({ROOT}docs/badge.svg)]({ROOT}docs/status.md)")
        );
    }

    #[test]
    fn test_rewrite_angle_destination() {
        let origin = same_origin("docs/home.md");
        assert_eq!(
            rewrite_references("[x](<my file.md>)", &origin),
            format!("[x](<{ROOT}docs/my file.md>)")
        );
    }

    #[test]
    fn test_rewrite_balanced_parens_in_destination() {
        let origin = same_origin("docs/home.md");
        assert_eq!(
            rewrite_references("[x](a_(1).md)", &origin),
            format!("[x]({ROOT}docs/a_(1).md)")
        );
    }

    #[test]
    fn test_rewrite_reference_definitions() {
        let origin = same_origin("docs/home.md");
        let text = "[guide][g]\n\n[g]: guide.md \"Guide\"\n[logo]: </img/logo.png>\n[^1]: footnote text\n";
        assert_eq!(
            rewrite_references(text, &origin),
            format!(
                "[guide][g]\n\n[g]: {ROOT}docs/guide.md \"Guide\"\n[logo]: <{ROOT}img/logo.png>\n[^1]: footnote text\n"
            )
        );
    }

    #[test]
    fn test_fenced_code_untouched() {
        let origin = same_origin("docs/home.md");
        let text = "[a](a.md)\n\n```md\n[b](b.md)\n```\n\n~~~~\n[c](c.md)\n~~~\n~~~~\n[d](d.md)\n";
        assert_eq!(
            rewrite_references(text, &origin),
            format!(
                "[a]({ROOT}docs/a.md)\n\n```md\n[b](b.md)\n```\n\n~~~~\n[c](c.md)\n~~~\n~~~~\n[d]({ROOT}docs/d.md)\n"
            )
        );
    }

    #[test]
    fn test_inline_code_untouched() {
        let origin = same_origin("docs/home.md");
        let text = "Use `[x](y.md)` or ``[z](w.md)``.";
        assert_eq!(rewrite_references(text, &origin), text);
    }

    #[test]
    fn test_not_a_link() {
        let origin = same_origin("docs/home.md");
        let text = "[not a link] (a.md) and [open(a.md) and \\[esc\\](b.md)";
        assert_eq!(rewrite_references(text, &origin), text);
    }

    #[test]
    fn test_construct_count_preserved() {
        let origin = Origin::external("https://host/pkg/docs/");
        let text = "[a](a.md) ![b](b.png) [c](https://x/c.md) [d](#d) ![e](/e.png)";
        let rewritten = rewrite_references(text, &origin);
        assert_eq!(rewritten.matches("](").count(), 5);
        assert_eq!(
            rewritten,
            "[a](https://host/pkg/docs/a.md) ![b](https://host/pkg/docs/b.png) [c](https://x/c.md) [d](#d) ![e](https://host/pkg/e.png)"
        );
    }

    #[test]
    fn test_unicode_text_preserved() {
        let origin = same_origin("docs/home.md");
        assert_eq!(
            rewrite_references("Überblick → [Anleitung](anleitung.md) ✓", &origin),
            format!("Überblick → [Anleitung]({ROOT}docs/anleitung.md) ✓")
        );
    }
}
