//! Plain-text rendering of analysis results.

use std::fmt::Write;

use bookstruct_classify::max_depth;
use bookstruct_core::{ClassifiedItem, DocumentModel, ImageEntry};
use bookstruct_shared::{ContentType, CoverSource, FlatNavEntry, NavigationNode, Section};

/// Headline numbers of a whole-package analysis.
pub(crate) fn summary(model: &DocumentModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "  Package:   {}", model.root);
    if let Some(opf) = &model.opf_path {
        let _ = writeln!(out, "  OPF:       {opf}");
    }
    let _ = writeln!(out, "  Documents: {}", model.documents.len());
    let _ = writeln!(out, "  Sections:  {}", model.section_count());
    let _ = writeln!(
        out,
        "  Chapters:  {} ({} parts)",
        model.count_of(ContentType::Chapter),
        model.count_of(ContentType::Part)
    );
    let _ = writeln!(
        out,
        "  TOC:       {} top-level entries, depth {}",
        model.navigation.len(),
        max_depth(&model.navigation)
    );
    let _ = writeln!(out, "  Images:    {}", model.images.len());
    match &model.cover {
        Some(cover) => {
            let _ = writeln!(out, "  Cover:     {} ({})", cover.path, cover_source(cover.source));
        }
        None => {
            let _ = writeln!(out, "  Cover:     none");
        }
    }
    let _ = writeln!(out);
    out
}

pub(crate) fn sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {}  [{} blocks, {} images]",
            i + 1,
            section.header,
            section.blocks.len(),
            section.images.len()
        );
        for image in &section.images {
            let _ = writeln!(out, "       {}", image.path);
        }
    }
    out
}

pub(crate) fn manifest(items: &[ClassifiedItem]) -> String {
    let id_width = items.iter().map(|i| i.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for item in items {
        let ordinal = item.ordinal.map(|n| n.to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<12}  {:>4}  {}",
            item.id,
            item.content_type.as_str(),
            ordinal,
            item.href
        );
    }
    out
}

pub(crate) fn toc(nodes: &[NavigationNode]) -> String {
    fn walk(nodes: &[NavigationNode], depth: usize, out: &mut String) {
        for node in nodes {
            let _ = writeln!(
                out,
                "{}{}  [{}{}]",
                "  ".repeat(depth),
                node.label,
                node.nav_type,
                node.ordinal.map(|n| format!(" {n}")).unwrap_or_default()
            );
            walk(&node.children, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(nodes, 0, &mut out);
    out
}

pub(crate) fn flat_toc(entries: &[FlatNavEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            entry.depth, entry.nav_type, entry.label, entry.href
        );
    }
    out
}

pub(crate) fn images(images: &[ImageEntry]) -> String {
    let mut out = String::new();
    for image in images {
        let _ = writeln!(out, "{:<8}  {}", image.kind.as_str(), image.path);
    }
    out
}

pub(crate) fn cover_source(source: CoverSource) -> &'static str {
    match source {
        CoverSource::ManifestProperty => "manifest cover-image property",
        CoverSource::MetaCover => "cover meta",
        CoverSource::FileName => "file name",
        CoverSource::FirstImage => "first image",
    }
}
