//! Removal of page chrome before content resolution.

use tracing::trace;

use crate::header::HeaderRules;
use crate::tree::{Document, MarkupElement, NodeId};

/// Tags that hold navigation, scripts or decoration rather than content.
const CHROME_TAGS: &[&str] = &["nav", "aside", "script", "style", "footer", "header"];

/// Detach chrome subtrees from the body.
///
/// A chrome element survives when it is itself header-like or wraps a
/// header, since some publishers put the chapter title inside `<header>`.
pub(crate) fn strip_chrome(doc: &mut Document, rules: &HeaderRules) {
    let Some(body) = doc.body() else {
        return;
    };

    let mut removals: Vec<(NodeId, NodeId)> = Vec::new();
    collect_chrome(body, rules, &mut removals);

    if !removals.is_empty() {
        trace!(count = removals.len(), "stripping chrome elements");
        doc.detach(&removals);
    }
}

fn collect_chrome(body: MarkupElement<'_>, rules: &HeaderRules, out: &mut Vec<(NodeId, NodeId)>) {
    let mut stack = vec![body];
    while let Some(parent) = stack.pop() {
        for child in parent.children() {
            if CHROME_TAGS.contains(&child.tag()) && !rules.contains_header(child) {
                out.push((parent.id(), child.id()));
            } else {
                stack.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_tags(doc: &Document) -> Vec<String> {
        doc.body()
            .expect("body")
            .descendants()
            .map(|e| e.tag().to_string())
            .collect()
    }

    #[test]
    fn removes_chrome_without_headers() {
        let mut doc = Document::parse(
            r#"<html><body>
                <nav><a href="toc.xhtml">Contents</a></nav>
                <div><p>Text</p><script>var x;</script></div>
                <footer>Page 3</footer>
            </body></html>"#,
        );
        strip_chrome(&mut doc, &HeaderRules::default());
        assert_eq!(body_tags(&doc), vec!["div", "p"]);
    }

    #[test]
    fn keeps_chrome_that_wraps_a_header() {
        let mut doc = Document::parse(
            r#"<html><body>
                <header><h1>Chapter 1</h1></header>
                <p>Text</p>
                <aside class="sidebar-title">Note</aside>
            </body></html>"#,
        );
        strip_chrome(&mut doc, &HeaderRules::default());
        assert_eq!(body_tags(&doc), vec!["header", "h1", "p", "aside"]);
    }
}
