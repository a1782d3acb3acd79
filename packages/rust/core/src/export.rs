//! JSON export of the document model.

use std::path::Path;

use tracing::{debug, instrument};

use bookstruct_shared::{BookStructError, Result};

use crate::model::DocumentModel;

/// Pretty-printed JSON for `model`.
pub fn to_json(model: &DocumentModel) -> Result<String> {
    Ok(serde_json::to_string_pretty(model)?)
}

/// Write `model` to `path` as pretty JSON.
///
/// Writes to a temporary sibling first, then renames over the target.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_json(model: &DocumentModel, path: &Path) -> Result<()> {
    let json = to_json(model)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BookStructError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| BookStructError::config(format!("{} is not a file path", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &json).map_err(|e| BookStructError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| BookStructError::io(path, e))?;

    debug!(bytes = json.len(), "wrote document model");
    Ok(())
}
