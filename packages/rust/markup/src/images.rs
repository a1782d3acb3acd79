//! Image reference extraction and resolution.
//!
//! Raw `src`/`href` values are collected from content elements, then mapped
//! to package-root-relative paths and checked against the package's image
//! set. Dangling references are dropped without error; they are common in
//! the wild and say nothing about the rest of the document.

use std::collections::HashSet;

use bookstruct_shared::paths::{join_relative, strip_fragment};
use bookstruct_shared::{ImagePath, ImageSet};
use percent_encoding::percent_decode_str;
use tracing::trace;

use crate::tree::MarkupElement;

/// Prefixes of references that point outside the package.
const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "data:"];

/// Whether a reference points outside the package.
pub fn is_external(reference: &str) -> bool {
    EXTERNAL_PREFIXES.iter().any(|p| reference.starts_with(p))
}

/// Collect raw image references from an element, in order:
/// descendant `<img src>`, descendant SVG `<image href|xlink:href>`,
/// then the element itself when it is an image.
pub fn extract_image_refs(element: MarkupElement<'_>) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();

    for img in element.descendants().filter(|e| e.tag() == "img") {
        if let Some(src) = img.attr("src").filter(|s| !s.is_empty()) {
            refs.push(src.to_string());
        }
    }

    for image in element.descendants().filter(|e| e.tag() == "image") {
        if let Some(href) = svg_href(image) {
            refs.push(href.to_string());
        }
    }

    let own = match element.tag() {
        "img" => element.attr("src").filter(|s| !s.is_empty()),
        "image" => svg_href(element),
        _ => None,
    };
    if let Some(own) = own {
        if !refs.iter().any(|r| r == own) {
            refs.push(own.to_string());
        }
    }

    refs
}

fn svg_href<'a>(element: MarkupElement<'a>) -> Option<&'a str> {
    element
        .attr("href")
        .or_else(|| element.attr("xlink:href"))
        .filter(|s| !s.is_empty())
}

/// Resolves raw references found in one document.
#[derive(Debug, Clone, Copy)]
pub struct ImageResolver<'a> {
    base_dir: &'a str,
    known: &'a ImageSet,
}

impl<'a> ImageResolver<'a> {
    /// `base_dir` is the package-relative directory of the containing document.
    pub fn new(base_dir: &'a str, known: &'a ImageSet) -> Self {
        Self { base_dir, known }
    }

    /// Resolve, validate and deduplicate `raw` references.
    ///
    /// First occurrence wins; order of first appearance is preserved.
    pub fn resolve<S: AsRef<str>>(&self, raw: &[S]) -> Vec<ImagePath> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut resolved = Vec::new();

        for reference in raw {
            let Some(image) = self.resolve_one(reference.as_ref()) else {
                continue;
            };
            if seen.insert(image.path.clone()) {
                resolved.push(image);
            }
        }

        resolved
    }

    /// Resolve a single reference; `None` when it must be dropped.
    pub fn resolve_one(&self, reference: &str) -> Option<ImagePath> {
        if is_external(reference) {
            return Some(ImagePath::external(reference));
        }

        let path = strip_fragment(reference);
        if path.is_empty() {
            return None;
        }

        let decoded = percent_decode_str(path).decode_utf8_lossy();
        let candidate = join_relative(self.base_dir, &decoded);
        if self.known.contains(&candidate) {
            return Some(ImagePath::internal(candidate));
        }

        // File names that literally contain '%' sequences.
        if decoded != path {
            let literal = join_relative(self.base_dir, path);
            if self.known.contains(&literal) {
                return Some(ImagePath::internal(literal));
            }
        }

        trace!(reference, base_dir = self.base_dir, "dropping unresolved image reference");
        None
    }
}

/// Resolve `raw` references found in a document located in `containing_dir`.
pub fn resolve_image_refs<S: AsRef<str>>(
    raw: &[S],
    containing_dir: &str,
    known: &ImageSet,
) -> Vec<ImagePath> {
    ImageResolver::new(containing_dir, known).resolve(raw)
}
