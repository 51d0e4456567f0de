//! Latest-release lookup for the binary download tier.
use std::time::Duration;

use serde::Deserialize;

use crate::error::InstallError;

/// GitHub REST API base.
const GITHUB_API_URL: &str = "https://api.github.com";

/// Something that can name the newest release of a repository.
pub trait ReleaseSource: Send + Sync + std::fmt::Debug {
    /// Latest release tag of `repo` (`owner/name`), e.g. `v0.24.0` or `14.1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Network`] if the lookup fails or the response
    /// cannot be parsed.
    fn latest_tag(&self, repo: &str) -> Result<String, InstallError>;
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
}

/// Extract the tag from a `releases/latest` response body.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if the body is not a release object.
pub fn parse_tag_name(json: &str) -> Result<String, serde_json::Error> {
    serde_json::from_str::<GitHubRelease>(json).map(|r| r.tag_name)
}

/// [`ReleaseSource`] backed by the GitHub releases API.
#[derive(Debug)]
pub struct GithubReleases {
    agent: ureq::Agent,
}

impl GithubReleases {
    /// Create a client whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl ReleaseSource for GithubReleases {
    fn latest_tag(&self, repo: &str) -> Result<String, InstallError> {
        let url = format!("{GITHUB_API_URL}/repos/{repo}/releases/latest");
        let network = |detail: String| InstallError::Network {
            url: url.clone(),
            detail,
        };
        tracing::debug!("fetching {url}");

        let mut response = self
            .agent
            .get(&url)
            .header(
                "User-Agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )
            .header("Accept", "application/vnd.github+json")
            .call()
            .map_err(|e| network(e.to_string()))?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| network(e.to_string()))?;
        parse_tag_name(&body).map_err(|e| network(format!("unexpected response: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn parse_tag_from_release_json() {
        let json = r#"{
            "url": "https://api.github.com/repos/sharkdp/bat/releases/1",
            "tag_name": "v0.24.0",
            "name": "v0.24.0",
            "assets": []
        }"#;
        assert_eq!(parse_tag_name(json).unwrap(), "v0.24.0");
    }

    #[test]
    fn parse_rejects_error_payload() {
        let json = r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#;
        assert!(parse_tag_name(json).is_err());
        assert!(parse_tag_name("").is_err());
    }
}
