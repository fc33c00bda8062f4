//! Release creation and asset upload on the target repository.
//!
//! Publishing is all-or-nothing: a failed create or upload aborts the run
//! immediately. A half-published release (created but without its asset)
//! is not a state worth preserving, so nothing is retried and no cleanup
//! is attempted.

use crate::config::PublishConfig;
use crate::github::{self, CreatedRelease, ReleaseRequest};
use crate::output::write_stderr_line;
use crate::progress::{ProgressReader, ProgressReporter};
use camino::Utf8Path;
use std::io::Write;

/// Release notes used when the manifest file is missing.
pub const MISSING_MANIFEST_NOTES: &str = "Manifest not found; release generated automatically.";

/// Errors arising from release publication. All of them are fatal for the
/// publish run.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The create-release call returned a non-success status.
    #[error("release creation failed with status {status}: {body}")]
    CreateFailed {
        /// The HTTP status code returned.
        status: u16,
        /// The API's error body, for diagnostics.
        body: String,
    },

    /// The asset upload returned a non-success status.
    #[error("asset upload failed with status {status}: {body}")]
    UploadFailed {
        /// The HTTP status code returned.
        status: u16,
        /// The API's error body, for diagnostics.
        body: String,
    },

    /// A request failed before a status was received, or a response body
    /// could not be decoded.
    #[error("publish request to {url} failed: {reason}")]
    Http {
        /// The endpoint that was called.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// I/O error reading the archive or manifest.
    #[error("publish I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tag, title, and notes for one publish run.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    /// Tag the release is created under; also used as its title.
    pub tag: String,
    /// Release notes body.
    pub notes: String,
}

impl PublishPlan {
    /// Build the create-release request body for this plan.
    ///
    /// Releases are always published immediately: never draft, never
    /// prerelease.
    #[must_use]
    pub fn to_request(&self) -> ReleaseRequest {
        ReleaseRequest {
            tag_name: self.tag.clone(),
            name: self.tag.clone(),
            body: self.notes.clone(),
            draft: false,
            prerelease: false,
        }
    }
}

/// Read the manifest as release notes, substituting a placeholder when the
/// file does not exist.
#[must_use]
pub fn release_notes(manifest_path: &Utf8Path) -> String {
    std::fs::read_to_string(manifest_path).unwrap_or_else(|_| MISSING_MANIFEST_NOTES.to_owned())
}

/// Trait for the two write calls against the target repository, enabling
/// test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ReleasePublisher {
    /// Create a release and return its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] on any non-success status or transport
    /// failure.
    fn create_release(
        &self,
        config: &PublishConfig,
        request: &ReleaseRequest,
    ) -> Result<CreatedRelease, PublishError>;

    /// Upload `archive` as a binary asset of the release at `upload_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] on any non-success status or transport
    /// failure.
    fn upload_asset(
        &self,
        config: &PublishConfig,
        upload_url: &str,
        archive: &Utf8Path,
    ) -> Result<(), PublishError>;
}

/// Production publisher calling the GitHub REST API over `ureq`.
pub struct HttpReleasePublisher {
    progress: ProgressReporter,
}

impl HttpReleasePublisher {
    /// Create a publisher; upload progress follows the reporter's quiet
    /// setting.
    #[must_use]
    pub fn new(progress: ProgressReporter) -> Self {
        Self { progress }
    }
}

impl ReleasePublisher for HttpReleasePublisher {
    fn create_release(
        &self,
        config: &PublishConfig,
        request: &ReleaseRequest,
    ) -> Result<CreatedRelease, PublishError> {
        let url = github::api_create_release_url(&config.repository);
        let auth = format!("Bearer {}", config.token);
        log::debug!("creating release {} via {url}", request.tag_name);

        let response = github::http_agent_lenient()
            .post(url.as_str())
            .header("user-agent", github::USER_AGENT)
            .header("authorization", auth.as_str())
            .send_json(request)
            .map_err(|e| http_error(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::CreateFailed {
                status: status.as_u16(),
                body: read_body_text(response),
            });
        }
        response
            .into_body()
            .read_json::<CreatedRelease>()
            .map_err(|e| http_error(&url, &e))
    }

    fn upload_asset(
        &self,
        config: &PublishConfig,
        upload_url: &str,
        archive: &Utf8Path,
    ) -> Result<(), PublishError> {
        let file_name = archive.file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("archive path {archive} has no file name"),
            )
        })?;
        let size = std::fs::metadata(archive)?.len();
        let url = format!(
            "{}?name={file_name}",
            github::normalized_upload_url(upload_url)
        );
        let auth = format!("Bearer {}", config.token);

        let bar = self.progress.bytes_bar(file_name, Some(size));
        let reader = ProgressReader::new(std::fs::File::open(archive)?, bar);

        let response = github::http_agent_lenient()
            .post(url.as_str())
            .header("user-agent", github::USER_AGENT)
            .header("authorization", auth.as_str())
            .header("content-type", "application/zip")
            .header("content-length", size.to_string().as_str())
            .send(ureq::SendBody::from_owned_reader(reader))
            .map_err(|e| http_error(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::UploadFailed {
                status: status.as_u16(),
                body: read_body_text(response),
            });
        }
        Ok(())
    }
}

/// Create the release, then upload the archive to it.
///
/// The upload is only attempted after a successful create; a create
/// failure surfaces before any bytes are sent.
///
/// # Errors
///
/// Propagates the first [`PublishError`] from either call.
pub fn publish_archive(
    publisher: &dyn ReleasePublisher,
    config: &PublishConfig,
    plan: &PublishPlan,
    archive: &Utf8Path,
    stderr: &mut dyn Write,
) -> Result<CreatedRelease, PublishError> {
    write_stderr_line(stderr, format!("Creating release {}...", plan.tag));
    let created = publisher.create_release(config, &plan.to_request())?;

    write_stderr_line(stderr, format!("Uploading {archive}..."));
    publisher.upload_asset(config, &created.upload_url, archive)?;

    Ok(created)
}

/// Best-effort read of a response body for an error message.
fn read_body_text(response: ureq::http::Response<ureq::Body>) -> String {
    response.into_body().read_to_string().unwrap_or_default()
}

/// Format a transport failure as [`PublishError::Http`].
fn http_error(url: &str, reason: &dyn std::fmt::Display) -> PublishError {
    PublishError::Http {
        url: url.to_owned(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
