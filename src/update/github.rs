use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{Release, ReleaseSource};

const USER_AGENT: &str = concat!("exif-cleaner/", env!("CARGO_PKG_VERSION"));

/// Latest-release endpoint of the GitHub REST API.
pub struct GitHubReleases {
    api_url: String,
    timeout: Duration,
    client: Client,
}

impl GitHubReleases {
    pub fn new(api_url: String, timeout: Duration) -> Self {
        Self {
            api_url,
            timeout,
            client: Client::new(),
        }
    }

    /// Build the source for a repository URL such as
    /// `https://github.com/owner/repo`.
    pub fn for_repository(repository: &str, timeout: Duration) -> Option<Self> {
        github_api_url(repository).map(|url| Self::new(url, timeout))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest_release(&self) -> Result<Release> {
        let resp = self
            .client
            .get(&self.api_url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .context("GitHub request failed")?
            .error_for_status()
            .context("GitHub API error")?;

        let text = resp.text().await.context("Failed to read GitHub response")?;
        let release: Release = serde_json::from_str(&text).context("Failed to parse GitHub release JSON")?;
        Ok(release)
    }
}

/// The "latest release" API URL for a GitHub repository URL.
///
/// Returns `None` unless the URL is on `github.com` and names both an owner
/// and a repository. A trailing `.git` or `/` is ignored.
///
/// ```rust
/// use exif_cleaner::update::github_api_url;
///
/// assert_eq!(
///     github_api_url("https://github.com/JasonShane/clear_exif.git").as_deref(),
///     Some("https://api.github.com/repos/JasonShane/clear_exif/releases/latest"),
/// );
/// assert_eq!(github_api_url("https://gitlab.com/a/b"), None);
/// ```
pub fn github_api_url(repository: &str) -> Option<String> {
    let url = repository.trim();
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.strip_prefix("git@").unwrap_or(rest);
    let (host, path) = rest.split_once(['/', ':'])?;
    if !host.eq_ignore_ascii_case("github.com") {
        return None;
    }
    let path = path.trim_start_matches('/').trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    Some(format!("https://api.github.com/repos/{owner}/{repo}/releases/latest"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_from_repository() {
        let expected = Some("https://api.github.com/repos/owner/repo/releases/latest".to_string());
        assert_eq!(github_api_url("https://github.com/owner/repo"), expected);
        assert_eq!(github_api_url("https://github.com/owner/repo/"), expected);
        assert_eq!(github_api_url("https://github.com/owner/repo.git"), expected);
        assert_eq!(github_api_url("git@github.com:owner/repo.git"), expected);
    }

    #[test]
    fn api_url_rejects_incomplete_urls() {
        assert_eq!(github_api_url(""), None);
        assert_eq!(github_api_url("https://github.com/"), None);
        assert_eq!(github_api_url("https://github.com/owner"), None);
        assert_eq!(github_api_url("https://example.com/owner/repo"), None);
    }

    #[test]
    fn api_url_requires_exact_host() {
        assert_eq!(github_api_url("https://github.company.com/owner/repo"), None);
        assert_eq!(github_api_url("https://notgithub.com/owner/repo"), None);
        assert_eq!(github_api_url("https://example.com/github.com/owner/repo"), None);
        assert_eq!(
            github_api_url("ssh://git@github.com/owner/repo.git").as_deref(),
            Some("https://api.github.com/repos/owner/repo/releases/latest"),
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let source = GitHubReleases::new("http://127.0.0.1:9/releases/latest".into(), Duration::from_secs(2));
        let err = source.latest_release().await.unwrap_err();
        assert!(err.chain().any(|e| e.is::<reqwest::Error>()));
    }
}
