//! Table-of-contents classification.
//!
//! Labels are read first since they are written for humans ("Chapter 3",
//! "Appendix B"); the href's file name is the fallback signal.

use std::sync::LazyLock;

use regex::Regex;

use bookstruct_shared::{ContentType, FlatNavEntry, NavEntry, NavType, NavigationNode};

use crate::content::{classify, extract_chapter_number, extract_part_number};

static CHAPTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bchapter\s+(\d+)").expect("valid regex"));

static PART_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpart\s+(\d+|[ivxlcdm]+)\b").expect("valid regex"));

static BACK_MATTER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:appendix|afterword|epilogue|glossary|bibliography|references|notes|endnotes|colophon|about the author)\b",
    )
    .expect("valid regex")
});

static INDEX_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bindex\b").expect("valid regex"));

static FRONT_MATTER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:preface|foreword|introduction|prologue|dedication|copyright|epigraph|acknowledge?ments|title page|half title)\b",
    )
    .expect("valid regex")
});

/// Build the classified tree from raw entries, preserving order and nesting.
pub fn build(entries: &[NavEntry]) -> Vec<NavigationNode> {
    entries
        .iter()
        .map(|entry| {
            let (nav_type, ordinal) = classify_nav_entry(&entry.label, &entry.href);
            NavigationNode {
                label: entry.label.clone(),
                href: entry.href.clone(),
                nav_type,
                ordinal,
                children: build(&entry.children),
            }
        })
        .collect()
}

/// Type and chapter/part number of one table-of-contents entry.
pub fn classify_nav_entry(label: &str, href: &str) -> (NavType, Option<u32>) {
    if let Some(caps) = CHAPTER_LABEL.captures(label) {
        let ordinal = caps[1].parse().ok().or_else(|| extract_chapter_number("", href));
        return (NavType::Chapter, ordinal);
    }
    // "Part" must be followed by a real number; "Part Civil" is not a part.
    if let Some(ordinal) = PART_LABEL.captures(label).and_then(|caps| parse_number(&caps[1])) {
        return (NavType::Part, Some(ordinal));
    }
    if BACK_MATTER_LABEL.is_match(label) {
        return (NavType::BackMatter, None);
    }
    if INDEX_LABEL.is_match(label) {
        return (NavType::Index, None);
    }
    if FRONT_MATTER_LABEL.is_match(label) {
        return (NavType::FrontMatter, None);
    }

    match classify("", href) {
        ContentType::Chapter => (NavType::Chapter, extract_chapter_number("", href)),
        ContentType::Part => (NavType::Part, extract_part_number("", href)),
        ContentType::FrontMatter => (NavType::FrontMatter, None),
        ContentType::BackMatter => (NavType::BackMatter, None),
        ContentType::Index => (NavType::Index, None),
        ContentType::Navigation | ContentType::Other => (NavType::Other, None),
    }
}

/// Depth-first, depth-tagged listing of the tree (0 = top level).
pub fn flatten(nodes: &[NavigationNode]) -> Vec<FlatNavEntry> {
    fn walk(nodes: &[NavigationNode], depth: usize, out: &mut Vec<FlatNavEntry>) {
        for node in nodes {
            out.push(FlatNavEntry {
                label: node.label.clone(),
                href: node.href.clone(),
                nav_type: node.nav_type,
                depth,
            });
            walk(&node.children, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(nodes, 0, &mut out);
    out
}

/// Number of levels in the tree; 0 when empty.
pub fn max_depth(nodes: &[NavigationNode]) -> usize {
    nodes
        .iter()
        .map(|n| 1 + max_depth(&n.children))
        .max()
        .unwrap_or(0)
}

/// Arabic or Roman numeral.
fn parse_number(s: &str) -> Option<u32> {
    if let Ok(n) = s.parse() {
        return Some(n);
    }
    parse_roman(s)
}

/// Value of a well-formed Roman numeral written in a single case.
fn parse_roman(s: &str) -> Option<u32> {
    let upper = s.to_ascii_uppercase();
    if s != upper && s != s.to_ascii_lowercase() {
        return None;
    }

    let mut total = 0u32;
    let mut prev = 0u32;
    for c in upper.chars().rev() {
        let value = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            prev = value;
        }
    }

    // Only the canonical spelling counts: rejects "IIII", "VX", "IL".
    (total > 0 && to_roman(total) == upper).then_some(total)
}

fn to_roman(mut n: u32) -> String {
    const NUMERALS: &[(u32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut out = String::new();
    for &(value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}
