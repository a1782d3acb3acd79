//! EPUB 3 navigation document.

use bookstruct_markup::{Document, MarkupElement};
use bookstruct_shared::NavEntry;

use crate::xml::rebase_href;

/// Parse the table of contents of a navigation document in `nav_dir`.
///
/// Uses the `<nav epub:type="toc">` element, or the first `<nav>` when none
/// is typed. Markup problems never fail; they just yield fewer entries.
pub fn parse_nav_document(markup: &str, nav_dir: &str) -> Vec<NavEntry> {
    let doc = Document::parse(markup);
    let navs: Vec<MarkupElement<'_>> = doc
        .root()
        .descendants_and_self()
        .filter(|el| el.tag() == "nav")
        .collect();

    let toc = navs
        .iter()
        .copied()
        .find(|nav| is_toc(*nav))
        .or_else(|| navs.first().copied());

    let Some(toc) = toc else {
        return Vec::new();
    };

    toc.children()
        .find(|c| matches!(c.tag(), "ol" | "ul"))
        .map(|list| parse_list(list, nav_dir))
        .unwrap_or_default()
}

fn is_toc(nav: MarkupElement<'_>) -> bool {
    nav.attr("epub:type")
        .or_else(|| nav.attr("type"))
        .is_some_and(|t| t.split_ascii_whitespace().any(|v| v == "toc"))
}

fn parse_list(list: MarkupElement<'_>, nav_dir: &str) -> Vec<NavEntry> {
    let mut entries = Vec::new();

    for item in list.children().filter(|c| c.tag() == "li") {
        let children = item
            .children()
            .find(|c| matches!(c.tag(), "ol" | "ul"))
            .map(|sub| parse_list(sub, nav_dir))
            .unwrap_or_default();

        let Some(link) = item.children().find(|c| matches!(c.tag(), "a" | "span")) else {
            // An item without its own label still contributes its sub-list.
            entries.extend(children);
            continue;
        };

        let href = link
            .attr("href")
            .map(|h| rebase_href(nav_dir, h))
            .unwrap_or_default();
        entries.push(NavEntry::new(collapse_whitespace(&link.text()), href).with_children(children));
    }

    entries
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
