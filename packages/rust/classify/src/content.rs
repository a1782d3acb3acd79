//! Manifest entry classification.
//!
//! Each entry is matched against an ordered table of delimiter-bounded,
//! case-insensitive patterns: first the manifest id, then the file name of
//! its href. The first pattern that matches decides the type, so an id that
//! says nothing useful (`chapter-id357`) defers to the file name
//! (`part01.html`).

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use bookstruct_shared::paths::file_name;
use bookstruct_shared::{ContentType, ImageKind, ManifestEntry};

// ---------------------------------------------------------------------------
// Pattern tables
// ---------------------------------------------------------------------------

/// Wrap an alternation so it only matches as a whole token.
///
/// The token must start the string or follow a non-alphanumeric character,
/// and must end the string or be followed by a non-letter. Digits may follow
/// (`appendix01`), letters may not (`partner`).
fn token(alternation: &str) -> Regex {
    Regex::new(&format!(r"(?i)(?:^|[^a-z0-9])(?:{alternation})(?:[^a-z]|$)")).expect("valid regex")
}

/// Same boundary rules as [`token`], with the number captured in group 1.
fn numbered(pattern: &str) -> Regex {
    Regex::new(&format!(r"(?i)(?:^|[^a-z0-9])(?:{pattern})(?:[^a-z0-9]|$)")).expect("valid regex")
}

struct Rule {
    kind: ContentType,
    pattern: Regex,
}

/// Classification rules in priority order.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule {
            kind: ContentType::Navigation,
            pattern: token("toc|nav|contents|table-of-contents|ncx"),
        },
        Rule {
            kind: ContentType::Index,
            pattern: token("index"),
        },
        Rule {
            kind: ContentType::Part,
            pattern: token(r"part[-_ ]?\d+|part-id[a-z0-9]+"),
        },
        Rule {
            kind: ContentType::Chapter,
            pattern: token(r"chapter[-_ ]?\d+|ch[-_]?\d+"),
        },
        Rule {
            kind: ContentType::FrontMatter,
            pattern: token(
                "titlepage|title-page|title|halftitle|half-title|cover|copyright|dedication\
                 |epigraph|foreword|preface|prologue|acknowledge?ments|frontmatter|front-matter\
                 |introduction",
            ),
        },
        Rule {
            kind: ContentType::BackMatter,
            pattern: token(
                "appendix|afterword|epilogue|glossary|bibliography|references|notes|endnotes\
                 |colophon|about-the-author|backmatter|back-matter",
            ),
        },
    ]
});

static PART_ORDINALS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![numbered(r"part-id(\d+)"), numbered(r"part[-_ ]?(\d+)")]);

static CHAPTER_ORDINALS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![numbered(r"chapter[-_ ]?(\d+)"), numbered(r"ch[-_]?(\d+)")]);

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Content type and number of one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub content_type: ContentType,
    /// Part number for parts, chapter number for chapters.
    pub ordinal: Option<u32>,
}

/// Classify a manifest entry from its id and href.
pub fn classify(id: &str, href: &str) -> ContentType {
    let name = file_name(href);
    [id, name]
        .into_iter()
        .filter(|s| !s.is_empty())
        .find_map(|source| {
            RULES
                .iter()
                .find(|rule| rule.pattern.is_match(source))
                .map(|rule| rule.kind)
        })
        .unwrap_or(ContentType::Other)
}

/// Classify `entry` and extract the number that goes with its type.
pub fn classify_entry(entry: &ManifestEntry) -> Classification {
    let content_type = classify(&entry.id, &entry.href);
    let ordinal = match content_type {
        ContentType::Part => extract_part_number(&entry.id, &entry.href),
        ContentType::Chapter => extract_chapter_number(&entry.id, &entry.href),
        _ => None,
    };
    trace!(id = %entry.id, %content_type, ?ordinal, "classified manifest entry");
    Classification {
        content_type,
        ordinal,
    }
}

// ---------------------------------------------------------------------------
// Ordinals
// ---------------------------------------------------------------------------

/// First part or chapter number found in the id, else in the href.
pub fn extract_ordinal(id: &str, href: &str) -> Option<u32> {
    first_number(id, href, PART_ORDINALS.iter().chain(CHAPTER_ORDINALS.iter()))
}

/// Part number from the id, else from the href.
pub fn extract_part_number(id: &str, href: &str) -> Option<u32> {
    first_number(id, href, PART_ORDINALS.iter())
}

/// Chapter number from the id, else from the href.
pub fn extract_chapter_number(id: &str, href: &str) -> Option<u32> {
    first_number(id, href, CHAPTER_ORDINALS.iter())
}

fn first_number<'r>(
    id: &str,
    href: &str,
    patterns: impl Iterator<Item = &'r Regex> + Clone,
) -> Option<u32> {
    [id, file_name(href)]
        .into_iter()
        .filter(|s| !s.is_empty())
        .find_map(|source| {
            patterns.clone().find_map(|re| {
                re.captures(source)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse().ok())
            })
        })
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Guess the role of an image from its file name and manifest id.
pub fn classify_image(filename: &str, id: &str) -> ImageKind {
    let name = file_name(filename).to_lowercase();
    let id = id.to_lowercase();
    let mentions = |needle: &str| name.contains(needle) || id.contains(needle);

    if mentions("cover") {
        ImageKind::Cover
    } else if mentions("fig") {
        ImageKind::Figure
    } else if mentions("diag") {
        ImageKind::Diagram
    } else {
        ImageKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classifies_standard_names() {
        assert_eq!(classify("chapter-1", "Text/chapter-1.xhtml"), ContentType::Chapter);
        assert_eq!(classify("ch03", "ch03.html"), ContentType::Chapter);
        assert_eq!(classify("part-1", "Text/part-1.xhtml"), ContentType::Part);
        assert_eq!(classify("part01", "Text/part01.xhtml"), ContentType::Part);
        assert_eq!(classify("preface", "Text/preface.xhtml"), ContentType::FrontMatter);
        assert_eq!(classify("titlepage", "titlepage.xhtml"), ContentType::FrontMatter);
        assert_eq!(classify("appendix-a", "Text/appendix-a.xhtml"), ContentType::BackMatter);
        assert_eq!(classify("toc", "toc.xhtml"), ContentType::Navigation);
        assert_eq!(classify("ncx", "toc.ncx"), ContentType::Navigation);
        assert_eq!(classify("ix", "index.html"), ContentType::Index);
        assert_eq!(classify("item7", "xhtml/0007.xhtml"), ContentType::Other);
    }

    #[test]
    fn file_name_decides_when_id_is_opaque() {
        assert_eq!(classify("chapter-id357", "part01.html"), ContentType::Part);
        assert_eq!(classify("unknown-id", "part02.xhtml"), ContentType::Part);
        assert_eq!(classify("id42", "OEBPS/ch07.xhtml"), ContentType::Chapter);
    }

    #[test]
    fn publisher_part_ids() {
        assert_eq!(classify("part-id357", "part01.html"), ContentType::Part);
        assert_eq!(classify("part-idm4512", "p.html"), ContentType::Part);
    }

    #[test]
    fn embedded_words_do_not_match() {
        assert_eq!(classify("partner-1", "Text/partner.html"), ContentType::Other);
        assert_eq!(classify("depart-1", "Text/depart.html"), ContentType::Other);
        assert_eq!(classify("navigator", "navigator.html"), ContentType::Other);
        assert_eq!(classify("footnotes", "footnotes.html"), ContentType::Other);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("PART-1", "Text/PART-1.XHTML"), ContentType::Part);
        assert_eq!(classify("Chapter_2", "CHAPTER_2.HTML"), ContentType::Chapter);
        assert_eq!(extract_part_number("PART-2", "TEXT/PART-2.HTML"), Some(2));
    }

    #[test]
    fn ordinal_precedence() {
        assert_eq!(extract_ordinal("part-id357", "part01.html"), Some(357));
        assert_eq!(extract_ordinal("chapter-id357", "part01.html"), Some(1));
        assert_eq!(extract_ordinal("chapter-12", "part01.html"), Some(12));
        assert_eq!(extract_ordinal("random", "random.html"), None);
        assert_eq!(extract_ordinal("", ""), None);
    }

    #[test]
    fn part_number_family() {
        assert_eq!(extract_part_number("part-2", "part05.html"), Some(2));
        assert_eq!(extract_part_number("random-id", "part04.html"), Some(4));
        assert_eq!(extract_part_number("part-5", "random.html"), Some(5));
        assert_eq!(extract_part_number("chapter-1", "Text/chapter-1.xhtml"), None);
        assert_eq!(extract_part_number("preface", "Text/preface.xhtml"), None);
    }

    #[test]
    fn chapter_number_family() {
        assert_eq!(extract_chapter_number("chapter-3", "c.html"), Some(3));
        assert_eq!(extract_chapter_number("x", "ch012.xhtml"), Some(12));
        assert_eq!(extract_chapter_number("chapter-idm123", "x.html"), None);
        assert_eq!(extract_chapter_number("part-1", "part-1.html"), None);
    }

    #[test]
    fn classify_entry_pairs_type_and_number() {
        let entry = ManifestEntry {
            id: "chapter-id357".into(),
            href: "OEBPS/part01.html".into(),
            media_type: "application/xhtml+xml".into(),
            properties: None,
        };
        assert_eq!(
            classify_entry(&entry),
            Classification {
                content_type: ContentType::Part,
                ordinal: Some(1),
            }
        );
    }

    #[test]
    fn image_kinds() {
        assert_eq!(classify_image("cover.png", "cover-image"), ImageKind::Cover);
        assert_eq!(classify_image("images/B31105_01_01.png", "fig1"), ImageKind::Figure);
        assert_eq!(classify_image("diagram-example.jpg", "diag1"), ImageKind::Diagram);
        assert_eq!(classify_image("photo.jpg", "img3"), ImageKind::Other);
    }

    proptest! {
        #[test]
        fn prop_classification_is_deterministic(
            id in "[A-Za-z0-9_.\\-]{0,24}",
            href in "[A-Za-z0-9_./\\-]{0,32}",
        ) {
            prop_assert_eq!(classify(&id, &href), classify(&id, &href));
            prop_assert_eq!(extract_ordinal(&id, &href), extract_ordinal(&id, &href));
        }

        #[test]
        fn prop_classification_ignores_ascii_case(
            id in "[A-Za-z0-9_.\\-]{0,24}",
            href in "[A-Za-z0-9_./\\-]{0,32}",
        ) {
            let upper_id = id.to_ascii_uppercase();
            let upper_href = href.to_ascii_uppercase();
            prop_assert_eq!(classify(&id, &href), classify(&upper_id, &upper_href));
            prop_assert_eq!(
                extract_ordinal(&id, &href),
                extract_ordinal(&upper_id, &upper_href)
            );
        }
    }
}
