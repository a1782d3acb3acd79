//! OPF package document: manifest, spine and EPUB 2 cover declaration.

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::trace;

use bookstruct_shared::{BookStructError, ManifestEntry, Result, SpineItem};

use crate::xml::{attr, local_name, rebase_href};

/// Media type of EPUB 2 NCX navigation files.
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// The parts of a package document the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpfDocument {
    /// Manifest entries in declaration order, hrefs package-root-relative.
    pub manifest: Vec<ManifestEntry>,
    pub spine: Vec<SpineItem>,
    /// Manifest id named by the spine's `toc` attribute.
    pub toc_id: Option<String>,
    /// Manifest id named by `<meta name="cover" content="...">`.
    pub meta_cover_id: Option<String>,
}

impl OpfDocument {
    /// Look up a manifest entry by id.
    pub fn entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|e| e.id == id)
    }

    /// Manifest entry of the NCX file: the spine's `toc` item, else the
    /// first entry with the NCX media type.
    pub fn ncx_entry(&self) -> Option<&ManifestEntry> {
        self.toc_id
            .as_deref()
            .and_then(|id| self.entry(id))
            .or_else(|| self.manifest.iter().find(|e| e.media_type == NCX_MEDIA_TYPE))
    }

    /// Manifest entry of the EPUB 3 navigation document.
    pub fn nav_entry(&self) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|e| e.has_property("nav"))
    }
}

/// Parse an OPF document located in `opf_dir` (package-relative).
pub fn parse_opf(content: &str, opf_dir: &str) -> Result<OpfDocument> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut doc = OpfDocument::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"item" => {
                    let id = attr(&e, b"id").unwrap_or_default();
                    let href = attr(&e, b"href").unwrap_or_default();
                    if id.is_empty() || href.is_empty() {
                        trace!(%id, %href, "skipping incomplete manifest item");
                        continue;
                    }
                    if !seen_ids.insert(id.clone()) {
                        trace!(%id, "skipping duplicate manifest id");
                        continue;
                    }
                    doc.manifest.push(ManifestEntry {
                        id,
                        href: rebase_href(opf_dir, &href),
                        media_type: attr(&e, b"media-type").unwrap_or_default(),
                        properties: attr(&e, b"properties").filter(|p| !p.trim().is_empty()),
                    });
                }
                b"itemref" => {
                    if let Some(idref) = attr(&e, b"idref").filter(|s| !s.is_empty()) {
                        let linear = attr(&e, b"linear")
                            .is_none_or(|v| !v.trim().eq_ignore_ascii_case("no"));
                        doc.spine.push(SpineItem { idref, linear });
                    }
                }
                b"spine" => {
                    doc.toc_id = attr(&e, b"toc").filter(|s| !s.is_empty());
                }
                b"meta" => {
                    let is_cover = attr(&e, b"name").is_some_and(|n| n == "cover");
                    if is_cover {
                        if let Some(content) = attr(&e, b"content").filter(|c| !c.is_empty()) {
                            doc.meta_cover_id = Some(content);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(BookStructError::parse(format!("package document: {e}"))),
            _ => {}
        }
    }

    Ok(doc)
}
