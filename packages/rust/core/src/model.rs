//! The whole-package document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookstruct_shared::{ContentType, CoverImage, ImageKind, NavigationNode, Section};

/// Current model schema version. Bump on breaking changes to the JSON shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything inferred about one package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentModel {
    pub schema_version: u32,
    /// Package root as given by the caller.
    pub root: String,
    /// Package-relative path of the OPF document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opf_path: Option<String>,
    pub analyzed_at: DateTime<Utc>,
    /// Classified manifest entries, in declaration order.
    pub manifest: Vec<ClassifiedItem>,
    /// Markup documents in reading order.
    pub reading_order: Vec<String>,
    /// Sections of each document, in reading order.
    pub documents: Vec<DocumentSections>,
    pub navigation: Vec<NavigationNode>,
    /// Every image in the package, sorted by path.
    pub images: Vec<ImageEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<CoverImage>,
}

/// A manifest entry with its inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    /// Whether the spine references the entry.
    pub in_spine: bool,
}

/// Segmentation result for one markup document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSections {
    /// Package-relative path.
    pub path: String,
    /// Type of the manifest entry for this document, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    /// SHA-256 of the document text; empty when it could not be read.
    pub content_hash: String,
    pub sections: Vec<Section>,
}

/// An image file and its guessed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub path: String,
    pub kind: ImageKind,
}

impl DocumentModel {
    /// Sections of the document at `path`.
    pub fn document(&self, path: &str) -> Option<&DocumentSections> {
        self.documents.iter().find(|d| d.path == path)
    }

    pub fn section_count(&self) -> usize {
        self.documents.iter().map(|d| d.sections.len()).sum()
    }

    /// Number of manifest entries of the given type.
    pub fn count_of(&self, content_type: ContentType) -> usize {
        self.manifest
            .iter()
            .filter(|item| item.content_type == content_type)
            .count()
    }
}
