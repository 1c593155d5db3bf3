//! Checking for a newer release of the application.
//!
//! [`UpdateChecker`] asks a [`ReleaseSource`] (normally [`GitHubReleases`])
//! for the latest release once and remembers the answer.

mod github;

pub use github::{GitHubReleases, github_api_url};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::version::VersionInfo;

/// The parts of a published release the checker cares about.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Release {
    pub tag_name: String,
    pub body: Option<String>,
    pub html_url: String,
}

/// Where release information comes from.
///
/// Implement this to check another hosting service, or to stub the
/// network out in tests.
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self) -> Result<Release>;
}

/// Outcome of an update check.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateInfo {
    pub update_available: bool,
    pub current_version: String,
    pub latest_version: String,
    pub release_notes: String,
    pub release_url: String,
    /// Set when the check failed; `update_available` is then `false`.
    pub error: Option<String>,
}

impl UpdateInfo {
    fn failed(current_version: &str, error: impl Into<String>) -> Self {
        Self {
            current_version: current_version.to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Memoizing update checker.
///
/// # Example
///
/// ```rust,no_run
/// use exif_cleaner::update::UpdateChecker;
/// use exif_cleaner::version::VersionInfo;
/// use std::time::Duration;
///
/// # async fn example() {
/// let checker = UpdateChecker::new(VersionInfo::load(None), Duration::from_secs(10));
/// let info = checker.check_for_updates().await;
/// if info.update_available {
///     println!("Version {} is out: {}", info.latest_version, info.release_url);
/// }
/// # }
/// ```
pub struct UpdateChecker {
    version: VersionInfo,
    source: Option<Box<dyn ReleaseSource>>,
    cache: Mutex<Option<UpdateInfo>>,
}

impl UpdateChecker {
    /// Check against the GitHub repository named in `version`.
    pub fn new(version: VersionInfo, timeout: Duration) -> Self {
        let source = GitHubReleases::for_repository(&version.repository, timeout)
            .map(|s| Box::new(s) as Box<dyn ReleaseSource>);
        Self {
            version,
            source,
            cache: Mutex::new(None),
        }
    }

    pub fn with_source(version: VersionInfo, source: Box<dyn ReleaseSource>) -> Self {
        Self {
            version,
            source: Some(source),
            cache: Mutex::new(None),
        }
    }

    pub fn current_version(&self) -> &str {
        &self.version.version
    }

    /// Ask for the latest release. Only the first call goes to the
    /// source; later calls return the same answer, errors included.
    pub async fn check_for_updates(&self) -> UpdateInfo {
        let mut cache = self.cache.lock().await;
        if let Some(info) = cache.as_ref() {
            return info.clone();
        }
        let info = self.fetch().await;
        match &info.error {
            Some(e) => log::warn!("Update check failed: {e}"),
            None => log::info!(
                "Latest release {} (current {}, update available: {})",
                info.latest_version,
                info.current_version,
                info.update_available
            ),
        }
        *cache = Some(info.clone());
        info
    }

    async fn fetch(&self) -> UpdateInfo {
        let current = &self.version.version;
        let Some(source) = &self.source else {
            return UpdateInfo::failed(current, "Invalid repository URL");
        };

        let release = match source.latest_release().await {
            Ok(release) => release,
            Err(e) if e.chain().any(|c| c.is::<reqwest::Error>()) => {
                return UpdateInfo::failed(current, format!("Network error: {e:#}"));
            }
            Err(e) => return UpdateInfo::failed(current, format!("Error checking for updates: {e:#}")),
        };

        let tag = release.tag_name.trim();
        let latest = tag.strip_prefix('v').unwrap_or(tag);
        if latest.is_empty() {
            return UpdateInfo::failed(current, "Could not get version from release");
        }

        UpdateInfo {
            update_available: self.version.is_newer_version(latest),
            current_version: current.clone(),
            latest_version: latest.to_string(),
            release_notes: release.body.unwrap_or_default(),
            release_url: release.html_url,
            error: None,
        }
    }

    pub async fn is_update_available(&self) -> bool {
        self.check_for_updates().await.update_available
    }

    pub async fn latest_version(&self) -> String {
        self.check_for_updates().await.latest_version
    }

    pub async fn release_notes(&self) -> String {
        self.check_for_updates().await.release_notes
    }

    pub async fn release_url(&self) -> String {
        self.check_for_updates().await.release_url
    }
}
