//! Top-level error type for the packsync binaries.
//!
//! Library modules each define their own error enum; this aggregator exists
//! so the binaries' `run` functions can use `?` across module boundaries
//! and map everything to a single exit path.

use thiserror::Error;

/// Any fatal error a packsync binary can exit with.
#[derive(Debug, Error)]
pub enum PacksyncError {
    /// A configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The fetch run could not produce its manifest.
    #[error(transparent)]
    Fetch(#[from] crate::fetch::FetchError),

    /// The release package could not be created.
    #[error(transparent)]
    Package(#[from] crate::package::PackageError),

    /// Release creation or asset upload failed.
    #[error(transparent)]
    Publish(#[from] crate::publish::PublishError),

    /// The system clock reported a pre-epoch time.
    #[error("system time error: {0}")]
    Clock(#[from] std::time::SystemTimeError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`PacksyncError`].
pub type Result<T> = std::result::Result<T, PacksyncError>;
