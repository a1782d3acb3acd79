//! Wrapper resolution: find the depth at which real content starts.
//!
//! Publishers wrap chapter bodies in one to three meaningless containers.
//! Descent is driven by child multiplicity, not a fixed depth: a container
//! with exactly one wrapper child is skipped, and the first level with zero
//! or several children is the content level.

use crate::header::HeaderRules;
use crate::tree::MarkupElement;

/// Generic containers that may be unwrapped one level at the content level.
const CONTAINER_TAGS: &[&str] = &["div", "section", "article"];

/// Containers that may be descended through while searching for content.
const WRAPPER_TAGS: &[&str] = &["div", "section", "article", "main"];

/// Descend single-child wrapper chains from `body`.
///
/// This is deliberately narrower than descending into any single child.
/// Only non-header `div`/`section`/`article`/`main` wrappers that have
/// element children of their own are entered. A lone `<p>`, a heading, or a
/// text-only `<div>` is never descended into, so it stays available as
/// content of its parent instead of becoming an empty content level.
pub fn find_content_container<'a>(body: MarkupElement<'a>, rules: &HeaderRules) -> MarkupElement<'a> {
    let mut current = body;

    loop {
        let mut children = current.children();
        let (Some(only), None) = (children.next(), children.next()) else {
            return current;
        };

        let is_wrapper = WRAPPER_TAGS.contains(&only.tag())
            && only.child_count() > 0
            && !rules.is_header(only);
        if !is_wrapper {
            return current;
        }
        current = only;
    }
}

/// The flat, ordered list of content-level elements under `body`.
pub fn content_elements<'a>(body: MarkupElement<'a>, rules: &HeaderRules) -> Vec<MarkupElement<'a>> {
    let container = find_content_container(body, rules);
    let children: Vec<MarkupElement<'a>> = container.children().collect();

    // Headers at this level define section boundaries; take everything.
    if children.iter().any(|c| rules.is_header(*c)) {
        return children;
    }

    let mut content = Vec::with_capacity(children.len());
    for child in children {
        if !CONTAINER_TAGS.contains(&child.tag()) {
            content.push(child);
            continue;
        }

        let before = content.len();
        content.extend(child.children());
        if content.len() == before && !child.text().trim().is_empty() {
            content.push(child);
        }
    }

    content
}
