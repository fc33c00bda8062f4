//! Latest-release resolution for source entries.
//!
//! One API call per entry resolves the newest published release, then the
//! first asset whose name ends with the configured suffix is selected. Any
//! failure here is per-entry: the caller records the entry as not found and
//! moves on.

use crate::github::{self, GithubRelease};

/// The resolved remote state for a source entry.
///
/// Discarded once the asset has been downloaded; only the version tag
/// outlives it, in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Direct download URL for the selected asset.
    pub download_url: String,
    /// File name of the selected asset.
    pub file_name: String,
    /// Version tag of the release the asset belongs to.
    pub version: String,
}

/// Errors arising from a latest-release lookup.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The API answered with a non-success status.
    #[error("release API returned status {status} for {url}")]
    ApiStatus {
        /// The endpoint that was queried.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The request failed before a status was received, or the response
    /// body could not be decoded.
    #[error("release lookup failed for {url}: {reason}")]
    Http {
        /// The endpoint that was queried.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },
}

/// Trait for querying a repository's latest release.
///
/// Abstracting the HTTP call lets tests drive the fetch pipeline without
/// network access.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseResolver {
    /// Fetch the latest published release of the repository at `repo_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the API call fails or the response is
    /// not a release object.
    fn latest_release(&self, repo_url: &str) -> Result<GithubRelease, ResolveError>;
}

/// Production resolver calling the GitHub REST API over `ureq`.
pub struct HttpReleaseResolver;

impl ReleaseResolver for HttpReleaseResolver {
    fn latest_release(&self, repo_url: &str) -> Result<GithubRelease, ResolveError> {
        let url = github::api_latest_release_url(repo_url);
        log::debug!("resolving latest release via {url}");
        let response = github::http_agent()
            .get(url.as_str())
            .header("user-agent", github::USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(&url, &e))?;
        response
            .into_body()
            .read_json::<GithubRelease>()
            .map_err(|e| ResolveError::Http {
                url,
                reason: e.to_string(),
            })
    }
}

/// Map a ureq error to a [`ResolveError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> ResolveError {
    match err {
        ureq::Error::StatusCode(status) => ResolveError::ApiStatus {
            url: url.to_owned(),
            status: *status,
        },
        other => ResolveError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// Select the release asset matching the declared file-type suffix.
///
/// Policy: the first asset whose name ends with `suffix` wins; there is no
/// scoring and no multi-match disambiguation. Returns `None` when nothing
/// matches.
///
/// # Examples
///
/// ```
/// use packsync::github::{GithubAsset, GithubRelease};
/// use packsync::resolve::select_asset;
///
/// let release = GithubRelease {
///     tag_name: "v1.2.3".to_owned(),
///     assets: vec![GithubAsset {
///         name: "tool-linux.tar.gz".to_owned(),
///         browser_download_url: "https://example.test/tool-linux.tar.gz".to_owned(),
///     }],
/// };
/// let asset = select_asset(&release, "tar.gz").expect("match");
/// assert_eq!(asset.version, "v1.2.3");
/// ```
#[must_use]
pub fn select_asset(release: &GithubRelease, suffix: &str) -> Option<ResolvedAsset> {
    release
        .assets
        .iter()
        .find(|asset| asset.name.ends_with(suffix))
        .map(|asset| ResolvedAsset {
            download_url: asset.browser_download_url.clone(),
            file_name: asset.name.clone(),
            version: release.tag_name.clone(),
        })
}
