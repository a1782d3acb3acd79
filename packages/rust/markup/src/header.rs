//! Header detection.
//!
//! Publishers mark chapter and section titles with anything from `<h1>` to
//! `<p class="chapter-label">`. An element counts as a header when its tag,
//! ARIA role, or class/id says so.

use crate::tree::MarkupElement;

/// Canonical heading tags.
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Substrings of class/id values that mark title-like elements.
const HEADER_KEYWORDS: &[&str] = &[
    "title",
    "heading",
    "chapter-head",
    "ch-title",
    "section-title",
    "chapter-label",
    "ch-label",
    "title-prefix",
    "chapter-number",
    "label",
    "title-text",
];

/// Default upper bound (exclusive) on the text length of keyword-matched headers.
pub const DEFAULT_HEADER_MAX_CHARS: usize = 200;

/// Header detection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRules {
    /// Keyword-matched elements must have fewer stripped characters than this.
    pub max_text_chars: usize,
}

impl Default for HeaderRules {
    fn default() -> Self {
        Self {
            max_text_chars: DEFAULT_HEADER_MAX_CHARS,
        }
    }
}

impl HeaderRules {
    /// Whether `element` looks like a header.
    pub fn is_header(&self, element: MarkupElement<'_>) -> bool {
        let tag = element.tag();
        if tag.is_empty() {
            return false;
        }

        if HEADING_TAGS.contains(&tag) {
            return true;
        }

        if element
            .attr("role")
            .is_some_and(|role| role.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("heading")))
        {
            return true;
        }

        let combined = format!(
            "{} {}",
            element.attr("class").unwrap_or_default(),
            element.attr("id").unwrap_or_default()
        )
        .to_lowercase();

        if !HEADER_KEYWORDS.iter().any(|kw| combined.contains(kw)) {
            return false;
        }

        // Large blocks that merely carry "title" in a class are content.
        let len = element.stripped_text().chars().count();
        len > 0 && len < self.max_text_chars
    }

    /// Whether `element` or any of its descendants is a header.
    pub fn contains_header(&self, element: MarkupElement<'_>) -> bool {
        element.descendants_and_self().any(|el| self.is_header(el))
    }
}

/// [`HeaderRules::is_header`] with default thresholds.
pub fn is_header(element: MarkupElement<'_>) -> bool {
    HeaderRules::default().is_header(element)
}
