//! Whole-package orchestration for bookstruct.
//!
//! Ties package loading, classification and segmentation together into a
//! single [`DocumentModel`] per package (see [`analyze_package`]).

pub mod export;
pub mod model;
pub mod pipeline;
pub mod progress;

pub use export::{to_json, write_json};
pub use model::{ClassifiedItem, DocumentModel, DocumentSections, ImageEntry, SCHEMA_VERSION};
pub use pipeline::{analyze_document, analyze_package, classify_images, classify_manifest, content_hash};
pub use progress::{ProgressReporter, SilentProgress};
