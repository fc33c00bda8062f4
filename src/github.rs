//! GitHub REST API types and URL plumbing shared by both binaries.
//!
//! Only the handful of fields packsync reads are modelled; the API returns
//! far more and serde ignores the rest.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout applied to every API call and asset transfer.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Client identifier sent with every request to the source release API.
pub const USER_AGENT: &str = concat!("packsync/", env!("CARGO_PKG_VERSION"));

/// A published release as returned by the `releases/latest` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    /// The release's git tag, reported as the entry's version.
    pub tag_name: String,
    /// Binary assets attached to the release.
    pub assets: Vec<GithubAsset>,
}

/// A single downloadable asset attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    /// Asset file name, matched against the configured suffix.
    pub name: String,
    /// Direct download URL for the asset.
    pub browser_download_url: String,
}

/// The subset of the create-release response the publisher needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRelease {
    /// Upload endpoint for release assets, as a URI template.
    pub upload_url: String,
    /// Browser URL of the created release, shown in the success message.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// JSON body for the create-release call.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseRequest {
    /// Tag to create the release under.
    pub tag_name: String,
    /// Release title.
    pub name: String,
    /// Release notes body.
    pub body: String,
    /// Always `false`; packsync releases are published immediately.
    pub draft: bool,
    /// Always `false`; packsync never marks releases as prereleases.
    pub prerelease: bool,
}

/// Map a repository page URL to its latest-release API endpoint.
///
/// # Examples
///
/// ```
/// let url = packsync::github::api_latest_release_url("https://github.com/owner/proj");
/// assert_eq!(url, "https://api.github.com/repos/owner/proj/releases/latest");
/// ```
#[must_use]
pub fn api_latest_release_url(repo_url: &str) -> String {
    let repo = repo_url
        .trim_end_matches('/')
        .replace("https://github.com/", "https://api.github.com/repos/");
    format!("{repo}/releases/latest")
}

/// Build the create-release API endpoint for an `owner/repo` reference.
///
/// # Examples
///
/// ```
/// let url = packsync::github::api_create_release_url("owner/proj");
/// assert_eq!(url, "https://api.github.com/repos/owner/proj/releases");
/// ```
#[must_use]
pub fn api_create_release_url(repository: &str) -> String {
    format!("https://api.github.com/repos/{repository}/releases")
}

/// Strip the URI-template suffix from an `upload_url`.
///
/// The API reports upload endpoints as templates such as
/// `.../assets{?name,label}`; everything from the first brace onward is
/// discarded.
#[must_use]
pub fn normalized_upload_url(upload_url: &str) -> &str {
    upload_url
        .split_once('{')
        .map_or(upload_url, |(base, _)| base)
}

/// Shared `ureq` agent with request timeout configuration.
///
/// Used for read-side calls where a non-success status should surface as
/// [`ureq::Error::StatusCode`].
pub fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(HTTP_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Shared `ureq` agent that reports non-success statuses as responses.
///
/// The publisher inspects status codes itself so it can include the API's
/// error body in its diagnostics.
pub fn http_agent_lenient() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(HTTP_TIMEOUT))
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}
