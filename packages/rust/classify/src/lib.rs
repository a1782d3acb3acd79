//! Naming-convention classification of manifest entries and table-of-contents
//! nodes.
//!
//! Publishers rarely declare what a file is. These classifiers recover the
//! role (chapter, part, front matter, ...) and any chapter or part number from
//! manifest ids, file names and navigation labels.

pub mod content;
pub mod navigation;

pub use content::{
    Classification, classify, classify_entry, classify_image, extract_chapter_number,
    extract_ordinal, extract_part_number,
};
pub use navigation::{build, classify_nav_entry, flatten, max_depth};
