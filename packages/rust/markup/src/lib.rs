//! Markup analysis for reflowable book content.
//!
//! Turns one XHTML/HTML document into an ordered list of [`Section`]s:
//! chrome is stripped, the content level is found beneath publisher
//! wrappers, and elements are grouped under the headers that precede them.
//! Image references are resolved against the package's known images.

mod boilerplate;
pub mod header;
pub mod images;
pub mod segment;
pub mod tree;
pub mod wrapper;
mod xhtml;

use tracing::{debug, instrument};

use bookstruct_shared::paths::parent_dir;
use bookstruct_shared::{ImageSet, Section};

pub use header::{HeaderRules, is_header};
pub use images::{ImageResolver, extract_image_refs, is_external, resolve_image_refs};
pub use segment::{SegmentOptions, segment};
pub use tree::{Document, MarkupElement, NodeId};
pub use wrapper::{content_elements, find_content_container};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Segment one document into sections.
///
/// `doc_path` is the document's package-relative path; image references are
/// resolved against its directory. A document without a `<body>` yields no
/// sections.
#[instrument(skip(markup, images, opts), fields(len = markup.len()))]
pub fn extract_sections(
    markup: &str,
    doc_path: &str,
    images: &ImageSet,
    opts: &SegmentOptions,
) -> Vec<Section> {
    let mut doc = Document::parse(markup);
    boilerplate::strip_chrome(&mut doc, &opts.header);

    let Some(body) = doc.body() else {
        debug!("no body element");
        return Vec::new();
    };

    let elements = content_elements(body, &opts.header);
    let base_dir = parent_dir(doc_path);
    let resolver = ImageResolver::new(&base_dir, images);
    let sections = segment(&elements, &resolver, opts);

    debug!(
        elements = elements.len(),
        sections = sections.len(),
        "segmented document"
    );
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Chapter 1</title><style>p { margin: 0 }</style></head>
<body>
  <nav epub:type="landmarks"><a href="../toc.xhtml">Contents</a></nav>
  <div id="page"><div class="chapter">
    <h1 class="chapter-title">Chapter 1: Beginnings</h1>
    <p>It was a bright cold day in April.</p>
    <div class="figure"><img src="../Images/fig%201.png" alt="Figure 1"/></div>
    <h2>Section A</h2>
    <p>More text <img src="https://example.com/remote.png"/></p>
  </div></div>
</body>
</html>"#;

    #[test]
    fn extracts_sections_from_full_document() {
        let images: ImageSet = ["OEBPS/Images/fig 1.png"].into_iter().collect();
        let sections = extract_sections(
            CHAPTER,
            "OEBPS/Text/ch01.xhtml",
            &images,
            &SegmentOptions::default(),
        );

        let headers: Vec<&str> = sections.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(headers, vec!["Chapter 1: Beginnings", "Section A"]);

        assert_eq!(sections[0].images.len(), 1);
        assert_eq!(sections[0].images[0].path, "OEBPS/Images/fig 1.png");
        assert!(!sections[0].images[0].external);

        assert_eq!(sections[1].images.len(), 1);
        assert!(sections[1].images[0].external);
        assert_eq!(sections[1].images[0].path, "https://example.com/remote.png");
    }

    #[test]
    fn nav_chrome_never_becomes_content() {
        let sections = extract_sections(
            CHAPTER,
            "OEBPS/Text/ch01.xhtml",
            &ImageSet::default(),
            &SegmentOptions::default(),
        );
        assert!(
            sections
                .iter()
                .flat_map(|s| s.blocks.iter())
                .all(|b| b.text != "Contents")
        );
    }

    #[test]
    fn page_markers_do_not_swallow_headings() {
        let markup = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body><div class="chapter"><a id="page_5"/><h1>Chapter Five</h1><p>Opening.</p>
<span epub:type="pagebreak" id="page_6"/><h2>Sub</h2><p>More.</p></div></body></html>"#;
        let sections = extract_sections(markup, "ch05.xhtml", &ImageSet::default(), &SegmentOptions::default());
        let headers: Vec<&str> = sections.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(headers, vec!["Chapter Five", "Sub"]);
        assert_eq!(sections[0].blocks.len(), 2);
    }

    #[test]
    fn self_closing_title_keeps_body() {
        let markup = "<html><head><title/></head><body><h1>Chapter One</h1><p>Text.</p></body></html>";
        let sections = extract_sections(markup, "ch01.xhtml", &ImageSet::default(), &SegmentOptions::default());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header, "Chapter One");
    }

    #[test]
    fn html_soup_still_segments() {
        let markup = "<html><body><h1>One</h1><p>a<br>b<p>c</body></html>";
        let sections = extract_sections(markup, "soup.html", &ImageSet::default(), &SegmentOptions::default());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].blocks.len(), 3);
    }

    #[test]
    fn missing_body_yields_nothing() {
        let sections = extract_sections(
            "<p>fragment without a body</p>",
            "text.html",
            &ImageSet::default(),
            &SegmentOptions::default(),
        );
        assert!(sections.is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        let sections = extract_sections("", "a.xhtml", &ImageSet::default(), &SegmentOptions::default());
        assert!(sections.is_empty());
    }
}
