//! Section segmentation.
//!
//! Walks content-level elements in order, drops boilerplate, and groups the
//! rest into sections keyed by the header that precedes them.

use std::collections::HashSet;

use bookstruct_shared::{ContentBlock, EngineConfig, ImagePath, Section};

use crate::header::HeaderRules;
use crate::images::{ImageResolver, extract_image_refs};
use crate::tree::MarkupElement;

/// Thresholds for the boilerplate filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOptions {
    /// Anchor-text ratio above which a block is treated as a menu.
    pub link_density_threshold: f64,
    /// Blocks must have more stripped characters than this to be checked.
    pub link_density_min_chars: usize,
    pub header: HeaderRules,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            link_density_threshold: 0.70,
            link_density_min_chars: 40,
            header: HeaderRules::default(),
        }
    }
}

impl From<&EngineConfig> for SegmentOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            link_density_threshold: config.link_density_threshold,
            link_density_min_chars: config.link_density_min_chars,
            header: HeaderRules {
                max_text_chars: config.header_max_chars,
            },
        }
    }
}

/// Group content-level elements into header-keyed sections.
///
/// Images are extracted before any filtering so a skipped element can never
/// hide an image from the image-only emptiness check.
pub fn segment(
    elements: &[MarkupElement<'_>],
    resolver: &ImageResolver<'_>,
    opts: &SegmentOptions,
) -> Vec<Section> {
    let mut builder = SectionBuilder::default();

    for &element in elements {
        let raw_images = extract_image_refs(element);
        let is_header = opts.header.is_header(element);

        if !is_header && is_boilerplate(element, raw_images.is_empty(), opts) {
            continue;
        }

        let images = resolver.resolve(&raw_images);
        let block = ContentBlock {
            tag: element.tag().to_string(),
            text: element.display_text(),
            html: element.outer_html(),
            images,
            is_header,
        };

        if is_header {
            builder.open(block);
        } else {
            builder.push(block);
        }
    }

    builder.finish()
}

/// Menus, breadcrumbs and whitespace-only wrappers.
fn is_boilerplate(element: MarkupElement<'_>, no_images: bool, opts: &SegmentOptions) -> bool {
    let text_len = element.stripped_text().chars().count();

    if text_len > opts.link_density_min_chars {
        let link_len: usize = element
            .descendants()
            .filter(|e| e.tag() == "a")
            .map(|a| a.stripped_text().chars().count())
            .sum();
        if link_len as f64 / text_len as f64 > opts.link_density_threshold {
            return true;
        }
    }

    text_len == 0 && no_images
}

#[derive(Default)]
struct SectionBuilder {
    sections: Vec<Section>,
    header: Option<String>,
    blocks: Vec<ContentBlock>,
}

impl SectionBuilder {
    /// Close the open section and start a new one headed by `block`.
    fn open(&mut self, block: ContentBlock) {
        self.close();
        self.header = Some(block.text.clone());
        self.blocks.push(block);
    }

    fn push(&mut self, block: ContentBlock) {
        self.blocks.push(block);
    }

    fn close(&mut self) {
        let header = self.header.take();
        if header.is_none() && self.blocks.is_empty() {
            return;
        }

        let blocks = std::mem::take(&mut self.blocks);
        let images = aggregate_images(&blocks);
        self.sections.push(Section {
            header: header
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| Section::DEFAULT_HEADER.to_string()),
            blocks,
            images,
        });
    }

    fn finish(mut self) -> Vec<Section> {
        self.close();
        self.sections
    }
}

fn aggregate_images(blocks: &[ContentBlock]) -> Vec<ImagePath> {
    let mut seen: HashSet<&str> = HashSet::new();
    blocks
        .iter()
        .flat_map(|b| b.images.iter())
        .filter(|img| seen.insert(img.path.as_str()))
        .cloned()
        .collect()
}
