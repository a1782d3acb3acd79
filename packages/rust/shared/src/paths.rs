//! Package-relative path normalization.
//!
//! Every path that crosses a component boundary goes through
//! [`normalize_path`], so image sets, manifest hrefs and resolved references
//! compare equal as plain strings.

/// Canonicalize a package-relative reference.
///
/// Backslashes become `/`, `.` and empty segments disappear, `..` removes the
/// preceding segment. A `..` with nothing left to remove would escape the
/// package root and is dropped.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Resolve `reference` against the package-relative directory `dir`.
pub fn join_relative(dir: &str, reference: &str) -> String {
    if dir.is_empty() {
        return normalize_path(reference);
    }
    normalize_path(&format!("{dir}/{reference}"))
}

/// Directory part of a package-relative path (`""` for files at the root).
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(idx) => normalized[..idx].to_string(),
        None => String::new(),
    }
}

/// Strip a `#fragment` and a `?query` suffix.
pub fn strip_fragment(reference: &str) -> &str {
    let end = reference.find(['#', '?']).unwrap_or(reference.len());
    &reference[..end]
}

/// Last path segment of a reference, without fragment or query.
pub fn file_name(reference: &str) -> &str {
    let path = strip_fragment(reference);
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
