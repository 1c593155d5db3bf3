use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::exif::{StripMode, StripOptions, removable_tags};

/// Top-level configuration for exif-cleaner.
///
/// Every section falls back to its defaults when missing, so a config file
/// only needs the keys it wants to change.
///
/// # Loading
///
/// ```rust,no_run
/// use exif_cleaner::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.output.copy_suffix = Some("_clean".into());
/// config.strip.strip_xmp = false;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How input paths are expanded into image lists.
    pub input: InputConfig,
    /// What gets removed.
    pub strip: StripConfig,
    /// Where cleaned images go (in place, copy, folder) and dry runs.
    pub output: OutputConfig,
    /// Release checks.
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Descend into sub-folders when a folder is given.
    pub recursive: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// Controls what is removed from each image.
///
/// # Example
///
/// ```rust
/// use exif_cleaner::config::StripConfig;
///
/// let strip = StripConfig {
///     default_tags: vec!["GPSLatitude".into(), "GPSLongitude".into()],
///     strip_xmp: true,
///     strip_iptc: false,    // keep captions written by a DAM
///     keep_thumbnail: true,
/// };
/// assert!(strip.options().strip_xmp);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Tag names pre-selected for selective removal.
    pub default_tags: Vec<String>,
    /// Remove XMP packets along with EXIF on a full strip.
    pub strip_xmp: bool,
    /// Remove Photoshop/IPTC blocks along with EXIF on a full strip.
    pub strip_iptc: bool,
    /// Keep the embedded preview when rewriting a payload.
    pub keep_thumbnail: bool,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            default_tags: removable_tags().iter().map(|t| t.name.to_string()).collect(),
            strip_xmp: true,
            strip_iptc: true,
            keep_thumbnail: true,
        }
    }
}

impl StripConfig {
    pub fn options(&self) -> StripOptions {
        StripOptions {
            strip_xmp: self.strip_xmp,
            strip_iptc: self.strip_iptc,
            keep_thumbnail: self.keep_thumbnail,
        }
    }

    /// Selective mode over [`StripConfig::default_tags`].
    pub fn default_mode(&self) -> StripMode {
        StripMode::selected(self.default_tags.iter().cloned())
    }
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, report what would be removed without modifying any files.
    pub dry_run: bool,
    /// If `true`, create a `.bak` copy before cleaning an image in place.
    pub backup_originals: bool,
    /// Write cleaned images into this folder instead of over the originals.
    pub output_dir: Option<PathBuf>,
    /// Write cleaned images as `name{suffix}.ext` instead of over the originals.
    pub copy_suffix: Option<String>,
}

impl OutputConfig {
    pub fn in_place(&self) -> bool {
        self.output_dir.is_none() && self.copy_suffix.as_deref().is_none_or(str::is_empty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Ask the release API for a newer version when the app starts.
    pub check_on_startup: bool,
    /// HTTP timeout for the release API.
    pub timeout_secs: u64,
    /// Version descriptor to use instead of `config/version.json`.
    pub version_file: Option<PathBuf>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_on_startup: false,
            timeout_secs: 10,
            version_file: None,
        }
    }
}

impl Config {
    /// Resolve the config file path, next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.input.recursive);
        assert!(config.strip.strip_xmp);
        assert!(config.strip.keep_thumbnail);
        assert_eq!(config.strip.default_tags.len(), removable_tags().len());
        assert!(!config.output.dry_run);
        assert!(config.output.in_place());
        assert_eq!(config.update.timeout_secs, 10);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert!(config.input.recursive);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"output": {"copy_suffix": "_clean"}, "strip": {"strip_iptc": false}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output.copy_suffix.as_deref(), Some("_clean"));
        assert!(!config.output.in_place());
        assert!(!config.strip.strip_iptc);
        assert!(config.strip.strip_xmp);
        assert!(config.input.recursive);
        assert_eq!(config.update.timeout_secs, 10);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.output.backup_originals = true;
        config.strip.default_tags = vec!["Make".into()];
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert!(loaded.output.backup_originals);
        assert_eq!(loaded.strip.default_tags, vec!["Make".to_string()]);
        assert_eq!(loaded.strip.default_mode(), StripMode::selected(["Make"]));
    }

    #[test]
    fn empty_suffix_is_in_place() {
        let output = OutputConfig {
            copy_suffix: Some(String::new()),
            ..OutputConfig::default()
        };
        assert!(output.in_place());
    }
}
