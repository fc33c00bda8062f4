//! Asset download with a name-addressed local cache.
//!
//! Downloads land in a flat directory keyed purely by asset file name. A
//! file that already exists is returned as-is without any network traffic.

use crate::github;
use crate::progress::{ProgressReader, ProgressReporter};
use camino::{Utf8Path, Utf8PathBuf};

/// Errors arising from asset downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The server answered with a non-success status; no file was written.
    #[error("download of {url} returned status {status}")]
    HttpStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The transfer failed before or while streaming the body.
    #[error("download of {url} failed: {reason}")]
    Transfer {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for fetching a URL to a local file, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait AssetFetcher {
    /// Stream the body of `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on a non-success status or transfer
    /// failure; no file is created for a non-success status.
    fn fetch(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError>;
}

/// HTTP fetcher streaming response bodies to disk with a progress bar.
pub struct HttpAssetFetcher {
    progress: ProgressReporter,
}

impl HttpAssetFetcher {
    /// Create a fetcher; progress bars follow the reporter's quiet setting.
    #[must_use]
    pub fn new(progress: ProgressReporter) -> Self {
        Self { progress }
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError> {
        let response = github::http_agent()
            .get(url)
            .header("user-agent", github::USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;

        let total = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let name = dest.file_name().unwrap_or("download").to_owned();
        let bar = self.progress.bytes_bar(&name, total);

        let mut reader = ProgressReader::new(response.into_body().into_reader(), bar);
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut reader, &mut file)?;
        reader.finish();
        Ok(())
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(status) => DownloadError::HttpStatus {
            url: url.to_owned(),
            status: *status,
        },
        other => DownloadError::Transfer {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// Outcome of a cache lookup-or-download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Local path of the asset file.
    pub path: Utf8PathBuf,
    /// Whether the file was already present and no transfer was made.
    pub from_cache: bool,
}

/// Flat, name-addressed cache of downloaded assets.
///
/// Presence of a file with the requested name is the only cache key: there
/// is no checksum and no staleness check, so an upstream asset republished
/// under the same name is served from the cache unchanged. Callers that
/// need a fresh copy must delete the cached file first.
#[derive(Debug, Clone)]
pub struct DownloadCache {
    dir: Utf8PathBuf,
}

impl DownloadCache {
    /// Create a cache rooted at `dir`; the directory is created on first use.
    #[must_use]
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Return the cached file named `file_name`, downloading it from `url`
    /// if it is not yet present.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the directory cannot be created or
    /// the fetch fails. A cached file never incurs either.
    pub fn ensure(
        &self,
        file_name: &str,
        url: &str,
        fetcher: &dyn AssetFetcher,
    ) -> Result<DownloadOutcome, DownloadError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        if path.exists() {
            log::debug!("cache hit for {file_name}");
            return Ok(DownloadOutcome {
                path,
                from_cache: true,
            });
        }
        fetcher.fetch(url, &path)?;
        Ok(DownloadOutcome {
            path,
            from_cache: false,
        })
    }
}
