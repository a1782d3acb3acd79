//! Application configuration for bookstruct.
//!
//! User config lives at `~/.bookstruct/bookstruct.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookStructError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bookstruct.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookstruct";

// ---------------------------------------------------------------------------
// Config structs (matching bookstruct.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Section segmentation thresholds.
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Image discovery settings.
    #[serde(default)]
    pub images: ImagesConfig,

    /// Package walking settings.
    #[serde(default)]
    pub package: PackageConfig,
}

/// `[segmentation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Anchor-text to total-text ratio above which a block counts as a menu.
    #[serde(default = "default_link_density_threshold")]
    pub link_density_threshold: f64,

    /// Blocks with this many characters or fewer skip the link-density check.
    #[serde(default = "default_link_density_min_chars")]
    pub link_density_min_chars: usize,

    /// Keyword-matched headers must be shorter than this.
    #[serde(default = "default_header_max_chars")]
    pub header_max_chars: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            link_density_threshold: default_link_density_threshold(),
            link_density_min_chars: default_link_density_min_chars(),
            header_max_chars: default_header_max_chars(),
        }
    }
}

fn default_link_density_threshold() -> f64 {
    0.70
}
fn default_link_density_min_chars() -> usize {
    40
}
fn default_header_max_chars() -> usize {
    200
}

/// `[images]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// File extensions (without dot, lowercase) recognized as images.
    #[serde(default = "default_image_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            extensions: default_image_extensions(),
        }
    }
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "svg", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Directory names never searched for content documents.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Segment documents on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            skip_dirs: default_skip_dirs(),
            parallel: true,
        }
    }
}

fn default_skip_dirs() -> Vec<String> {
    ["META-INF", "__MACOSX", ".git"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Engine config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime engine configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub link_density_threshold: f64,
    pub link_density_min_chars: usize,
    pub header_max_chars: usize,
    pub image_extensions: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EngineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            link_density_threshold: config.segmentation.link_density_threshold,
            link_density_min_chars: config.segmentation.link_density_min_chars,
            header_max_chars: config.segmentation.header_max_chars,
            image_extensions: config
                .images
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            skip_dirs: config.package.skip_dirs.clone(),
            parallel: config.package.parallel,
        }
    }
}

impl AppConfig {
    /// Reject values that would make the heuristics meaningless.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.segmentation.link_density_threshold;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(BookStructError::config(format!(
                "segmentation.link_density_threshold must be within 0.0..=1.0, got {ratio}"
            )));
        }
        if self.images.extensions.is_empty() {
            return Err(BookStructError::config("images.extensions must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bookstruct/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BookStructError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bookstruct/bookstruct.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BookStructError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        BookStructError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BookStructError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BookStructError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BookStructError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("link_density_threshold"));
        assert!(toml_str.contains("META-INF"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.segmentation.link_density_min_chars, 40);
        assert_eq!(parsed.segmentation.header_max_chars, 200);
        assert_eq!(parsed.images.extensions.len(), 6);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[segmentation]
link_density_threshold = 0.5

[images]
extensions = [".PNG", "avif"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.segmentation.link_density_min_chars, 40);

        let engine = EngineConfig::from(&config);
        assert_eq!(engine.link_density_threshold, 0.5);
        assert_eq!(engine.image_extensions, vec!["png", "avif"]);
        assert!(engine.parallel);
    }

    #[test]
    fn validation_rejects_bad_ratio() {
        let mut config = AppConfig::default();
        config.segmentation.link_density_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("link_density_threshold"));
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/definitely/not/here/bookstruct.toml")).unwrap_err();
        assert!(matches!(err, BookStructError::Io { .. }));
    }
}
