//! Error types for bookstruct.
//!
//! Library crates use [`BookStructError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only a broken package contract (missing root, unreadable directory) is an
//! error. Malformed markup, dangling image references and unclassifiable
//! entries are absorbed by the engine and never reach this type.

use std::path::PathBuf;

/// Top-level error type for all bookstruct operations.
#[derive(Debug, thiserror::Error)]
pub enum BookStructError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The caller handed over something that is not an unpacked package.
    #[error("package error: {message}")]
    Package { message: String },

    /// Markup or package-document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization of the document model failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookStructError>;

impl BookStructError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a package error from any displayable message.
    pub fn package(msg: impl Into<String>) -> Self {
        Self::Package {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BookStructError::config("bad threshold");
        assert_eq!(err.to_string(), "config error: bad threshold");

        let err = BookStructError::package("not a directory: /tmp/nope");
        assert!(err.to_string().contains("/tmp/nope"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = BookStructError::io("/books/missing", source);
        let msg = err.to_string();
        assert!(msg.contains("/books/missing"));
        assert!(msg.contains("gone"));
    }
}
