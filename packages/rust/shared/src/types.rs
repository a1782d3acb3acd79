//! Core domain types produced by the structural inference engine.
//!
//! Every value here is derived per parse invocation and never mutated after
//! construction.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::paths::normalize_path;

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// A resolved image reference.
///
/// Internal paths are package-root-relative and normalized; external paths
/// (`http://`, `https://`, `data:`) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImagePath {
    /// Normalized path or verbatim external reference.
    pub path: String,
    /// Whether the reference points outside the package.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,
}

impl ImagePath {
    /// A package-internal image.
    pub fn internal(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            external: false,
        }
    }

    /// A scheme-prefixed reference that bypasses validation.
    pub fn external(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            external: true,
        }
    }
}

/// The image files present in a package, as normalized root-relative paths.
///
/// Built once per package before any document is parsed, then only queried.
/// It has no mutating methods, so sharing it across threads is safe.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    paths: HashSet<String>,
}

impl ImageSet {
    /// Whether `path` (already normalized) names a known image.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All paths in lexicographic order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.paths.iter().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl<S: AsRef<str>> FromIterator<S> for ImageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter
                .into_iter()
                .map(|p| normalize_path(p.as_ref()))
                .collect(),
        }
    }
}

/// Coarse role of an image, guessed from its file name and manifest id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Cover,
    Figure,
    Diagram,
    Other,
}

impl ImageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Figure => "figure",
            Self::Diagram => "diagram",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a package's cover image was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverSource {
    /// EPUB 3 manifest item with the `cover-image` property.
    ManifestProperty,
    /// EPUB 2 `<meta name="cover" content="...">`.
    MetaCover,
    /// An image whose name or id looks like a cover.
    FileName,
    /// First image of the package, nothing better was declared.
    FirstImage,
}

/// The cover image of a package and how it was determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    /// Package-root-relative path.
    pub path: String,
    pub source: CoverSource,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// One content unit inside a [`Section`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Lowercase tag name of the source element.
    pub tag: String,
    /// Display text (whitespace-trimmed text content).
    pub text: String,
    /// Markup of the element, serialized from the parsed tree.
    pub html: String,
    /// Validated image references found in the element.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImagePath>,
    /// Whether the element opened a section.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_header: bool,
}

/// A header-delimited group of content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Header text, `"Intro"` when no header precedes the blocks.
    pub header: String,
    /// Blocks in document order; a header block, if any, comes first.
    pub blocks: Vec<ContentBlock>,
    /// Order-preserving, deduplicated union of all block images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImagePath>,
}

impl Section {
    /// Header used when content precedes the first header of a document.
    pub const DEFAULT_HEADER: &'static str = "Intro";
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// One resource declared in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    /// Package-root-relative href.
    pub href: String,
    pub media_type: String,
    /// Space-separated EPUB 3 properties (`nav`, `cover-image`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

impl ManifestEntry {
    /// Whether the space-separated `properties` attribute lists `prop`.
    pub fn has_property(&self, prop: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == prop))
    }

    /// Whether the entry is an (X)HTML content document.
    pub fn is_markup(&self) -> bool {
        matches!(
            self.media_type.as_str(),
            "application/xhtml+xml" | "text/html"
        )
    }

    /// Whether the entry is an image resource.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// One `itemref` of the spine, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpineItem {
    pub idref: String,
    /// `false` for `linear="no"` auxiliary content.
    pub linear: bool,
}

/// Classification of a manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Chapter,
    Part,
    FrontMatter,
    BackMatter,
    Navigation,
    Index,
    Other,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Part => "part",
            Self::FrontMatter => "front_matter",
            Self::BackMatter => "back_matter",
            Self::Navigation => "navigation",
            Self::Index => "index",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A raw table-of-contents entry as read from a navigation document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    pub label: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NavEntry>) -> Self {
        self.children = children;
        self
    }
}

/// Classification of a table-of-contents node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavType {
    Chapter,
    Part,
    FrontMatter,
    BackMatter,
    Index,
    Other,
}

impl NavType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Part => "part",
            Self::FrontMatter => "front_matter",
            Self::BackMatter => "back_matter",
            Self::Index => "index",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for NavType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified table-of-contents node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationNode {
    pub label: String,
    pub href: String,
    pub nav_type: NavType,
    /// Chapter or part number, when the label or href carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavigationNode>,
}

/// A navigation node tagged with its nesting depth (0 = top level).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatNavEntry {
    pub label: String,
    pub href: String,
    pub nav_type: NavType,
    pub depth: usize,
}
