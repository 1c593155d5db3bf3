use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

const DEFAULT_APP_NAME: &str = "EXIF Cleaner";
const DEFAULT_DESCRIPTION: &str = "A tool to batch remove EXIF information from images";

/// The application's version descriptor (`config/version.json`).
///
/// ```json
/// {
///   "version": "1.0.0",
///   "app_name": "EXIF Cleaner",
///   "description": "A tool to batch remove EXIF information from images",
///   "repository": "https://github.com/JasonShane/clear_exif"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    pub version: String,
    pub app_name: String,
    pub description: String,
    /// Project URL; update checks only work for GitHub repositories.
    pub repository: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            repository: env!("CARGO_PKG_REPOSITORY").to_string(),
        }
    }
}

impl VersionInfo {
    /// `config/version.json` next to the executable.
    pub fn default_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config").join("version.json"))
    }

    /// Load the descriptor from `path`, or from [`VersionInfo::default_path`].
    ///
    /// Never fails: a missing or broken file gives the built-in defaults.
    pub fn load(path: Option<&Path>) -> Self {
        match Self::try_load(path) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Using built-in version info: {e:#}");
                Self::default()
            }
        }
    }

    fn try_load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize version info")?;
        std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Version info saved to {}", path.display());
        Ok(())
    }

    /// Overlay the fields present in a JSON object onto this descriptor.
    ///
    /// ```rust
    /// use exif_cleaner::version::VersionInfo;
    ///
    /// let mut info = VersionInfo::default();
    /// info.merge(&serde_json::json!({ "version": "2.0.0" })).unwrap();
    /// assert_eq!(info.version, "2.0.0");
    /// assert_eq!(info.app_name, "EXIF Cleaner");
    /// ```
    pub fn merge(&mut self, patch: &serde_json::Value) -> Result<()> {
        let Some(fields) = patch.as_object() else {
            anyhow::bail!("version patch must be a JSON object");
        };
        let mut current = serde_json::to_value(&*self).context("Failed to serialize version info")?;
        if let Some(obj) = current.as_object_mut() {
            for (key, value) in fields {
                obj.insert(key.clone(), value.clone());
            }
        }
        *self = serde_json::from_value(current).context("Invalid version patch")?;
        Ok(())
    }

    /// Whether `remote` is strictly newer than this version.
    pub fn is_newer_version(&self, remote: &str) -> bool {
        compare_versions(remote, &self.version) == Ordering::Greater
    }
}

/// Split a dotted version into numbers.
///
/// A leading `v` is ignored. Anything that is not a plain dotted number
/// parses as `[0, 0, 0]`.
pub fn parse_version(s: &str) -> Vec<u64> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    s.split('.')
        .map(|part| part.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|_| vec![0, 0, 0])
}

/// Compare two dotted versions, padding the shorter one with zeros.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = parse_version(a);
    let b = parse_version(b);
    let len = a.len().max(b.len());
    let part = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);
    (0..len)
        .map(|i| part(&a, i).cmp(&part(&b, i)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse() {
        assert_eq!(parse_version("1.2.3"), vec![1, 2, 3]);
        assert_eq!(parse_version("v2.0"), vec![2, 0]);
        assert_eq!(parse_version("10"), vec![10]);
        assert_eq!(parse_version("1.2-beta"), vec![0, 0, 0]);
        assert_eq!(parse_version(""), vec![0, 0, 0]);
    }

    #[test]
    fn compare() {
        assert_eq!(compare_versions("1.0.1", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.9", "1.10"), Ordering::Less);
        assert_eq!(compare_versions("v2", "1.99.99"), Ordering::Greater);
        // garbage compares as 0.0.0
        assert_eq!(compare_versions("latest", "0"), Ordering::Equal);
    }

    #[test]
    fn newer() {
        let info = VersionInfo {
            version: "1.2.0".into(),
            ..VersionInfo::default()
        };
        assert!(info.is_newer_version("1.2.1"));
        assert!(info.is_newer_version("v1.3"));
        assert!(!info.is_newer_version("1.2.0"));
        assert!(!info.is_newer_version("1.1.9"));
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(VersionInfo::load(Some(&dir.path().join("none.json"))), VersionInfo::default());

        let broken = dir.path().join("version.json");
        std::fs::write(&broken, "[1, 2").unwrap();
        let info = VersionInfo::load(Some(&broken));
        assert_eq!(info.app_name, "EXIF Cleaner");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("version.json");
        std::fs::write(&path, r#"{"version": "3.1.4"}"#).unwrap();

        let info = VersionInfo::load(Some(&path));
        assert_eq!(info.version, "3.1.4");
        assert_eq!(info.app_name, "EXIF Cleaner");
    }

    #[test]
    fn merge_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("version.json");

        let mut info = VersionInfo::default();
        info.merge(&serde_json::json!({"version": "9.9.9", "repository": "https://github.com/a/b"}))
            .unwrap();
        info.save(&path).unwrap();

        let loaded = VersionInfo::load(Some(&path));
        assert_eq!(loaded.version, "9.9.9");
        assert_eq!(loaded.repository, "https://github.com/a/b");
        assert_eq!(loaded.description, DEFAULT_DESCRIPTION);

        assert!(info.merge(&serde_json::json!(["not", "an", "object"])).is_err());
        assert!(info.merge(&serde_json::json!({"version": 3})).is_err());
    }
}
