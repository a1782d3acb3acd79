//! Filesystem inventory of an unpacked package.

use std::path::Path;

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use bookstruct_shared::paths::normalize_path;
use bookstruct_shared::{BookStructError, ImageSet, Result};

/// Extensions of markup content documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["html", "xhtml", "htm"];

/// Everything one walk over the package finds.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// Frozen set of image files.
    pub images: ImageSet,
    /// Markup documents, sorted, outside the skipped directories.
    pub documents: Vec<String>,
    /// `*.opf` files, sorted.
    pub package_documents: Vec<String>,
}

/// Walk `root` once and classify every file by extension.
///
/// Only a missing or non-directory root is an error; unreadable entries
/// below it are logged and skipped.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn scan(root: &Path, image_extensions: &[String], skip_dirs: &[String]) -> Result<Inventory> {
    ensure_dir(root)?;

    let mut image_paths: Vec<String> = Vec::new();
    let mut documents = Vec::new();
    let mut package_documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = normalize_path(&relative.to_string_lossy());
        let Some(ext) = extension(&rel) else {
            continue;
        };

        if image_extensions.iter().any(|e| *e == ext) {
            image_paths.push(rel);
        } else if in_skipped_dir(&rel, skip_dirs) {
            continue;
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            documents.push(rel);
        } else if ext == "opf" {
            package_documents.push(rel);
        }
    }

    documents.sort();
    package_documents.sort();
    let images: ImageSet = image_paths.into_iter().collect();

    debug!(
        images = images.len(),
        documents = documents.len(),
        "scanned package"
    );

    Ok(Inventory {
        images,
        documents,
        package_documents,
    })
}

/// Image files under `root` whose lowercase extension is in `extensions`.
pub fn discover_images(root: &Path, extensions: &[String]) -> Result<ImageSet> {
    Ok(scan(root, extensions, &[])?.images)
}

/// Markup documents under `root`, sorted, outside `skip_dirs`.
pub fn discover_documents(root: &Path, skip_dirs: &[String]) -> Result<Vec<String>> {
    Ok(scan(root, &[], skip_dirs)?.documents)
}

pub(crate) fn ensure_dir(root: &Path) -> Result<()> {
    let meta = std::fs::metadata(root).map_err(|e| BookStructError::io(root, e))?;
    if !meta.is_dir() {
        return Err(BookStructError::package(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    Ok(())
}

fn extension(rel: &str) -> Option<String> {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn in_skipped_dir(rel: &str, skip_dirs: &[String]) -> bool {
    let mut segments: Vec<&str> = rel.split('/').collect();
    segments.pop();
    segments.iter().any(|s| skip_dirs.iter().any(|d| d == s))
}
