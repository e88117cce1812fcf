//! Shared utility functions for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Identifier of a footnote definition.
pub(crate) fn footnote_id(label: &str) -> String {
    let slug = crate::state::slugify(label);
    if slug.is_empty() {
        "fn".to_owned()
    } else {
        format!("fn-{slug}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_to_num() {
        assert_eq!(heading_level_to_num(HeadingLevel::H1), 1);
        assert_eq!(heading_level_to_num(HeadingLevel::H6), 6);
    }

    #[test]
    fn test_footnote_id() {
        assert_eq!(footnote_id("1"), "fn-1");
        assert_eq!(footnote_id("Long Note"), "fn-long-note");
        assert_eq!(footnote_id("!"), "fn");
    }
}
