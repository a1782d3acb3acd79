//! Shared types, error model, configuration, and path handling for bookstruct.
//!
//! This crate is the foundation depended on by all other bookstruct crates.
//! It provides:
//! - [`BookStructError`] — the unified error type
//! - Domain types ([`Section`], [`ContentBlock`], [`ImagePath`], [`ContentType`],
//!   [`NavigationNode`], [`ManifestEntry`])
//! - Configuration ([`AppConfig`], [`EngineConfig`], config loading)
//! - Package-relative path normalization ([`paths`])

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EngineConfig, ImagesConfig, PackageConfig, SegmentationConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{BookStructError, Result};
pub use types::{
    ContentBlock, ContentType, CoverImage, CoverSource, FlatNavEntry, ImageKind, ImagePath, ImageSet,
    ManifestEntry, NavEntry, NavType, NavigationNode, Section, SpineItem,
};
