//! The fetch pipeline: resolve, download, materialize, manifest.
//!
//! Entries are processed strictly in configured order and independently of
//! one another. Per-entry failures are narrated and recorded; only a
//! manifest write failure aborts the run, since without the manifest the
//! run has no usable result.

use crate::archive::{ArchiveKind, MaterializeSpec, materialize};
use crate::config::{SourceList, SourceSpec};
use crate::download::{AssetFetcher, DownloadCache, HttpAssetFetcher};
use crate::manifest::{Manifest, ManifestRow, ResolvedVersion};
use crate::output::write_stderr_line;
use crate::progress::ProgressReporter;
use crate::resolve::{HttpReleaseResolver, ReleaseResolver, select_asset};
use camino::Utf8PathBuf;
use std::io::Write;

/// Directory and behaviour settings for one fetch run.
///
/// Every path is explicit; defaults live on the CLI, not in module state.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Flat cache directory for downloaded assets.
    pub downloads_dir: Utf8PathBuf,
    /// Root of the unified pack tree.
    pub pack_dir: Utf8PathBuf,
    /// Where the manifest is written.
    pub manifest_path: Utf8PathBuf,
    /// Suppress progress bars and informational narration.
    pub quiet: bool,
}

/// Errors that abort a fetch run outright.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The manifest could not be written.
    #[error("cannot write manifest {path}: {source}")]
    ManifestWrite {
        /// The manifest path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one source entry during a fetch run.
#[derive(Debug, Clone)]
pub enum EntryOutcome {
    /// Resolved, downloaded, and materialized into the pack tree.
    Synced {
        /// The resolved release tag.
        version: String,
        /// Whether the asset came from the downloads cache.
        from_cache: bool,
    },
    /// Resolution failed or no asset matched the declared suffix.
    NotFound {
        /// Why the entry could not be resolved.
        reason: String,
    },
    /// Resolved, but the download or extraction failed.
    Failed {
        /// The resolved release tag.
        version: String,
        /// Why the entry failed after resolution.
        reason: String,
    },
}

/// Per-entry outcome of a fetch run.
#[derive(Debug, Clone)]
pub struct EntryReport {
    /// Entry name from `links.json`.
    pub name: String,
    /// What happened to the entry.
    pub outcome: EntryOutcome,
}

/// Result of a completed fetch run.
///
/// Partial success is the normal expected outcome; callers inspect the
/// counts rather than a pass/fail flag.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Outcomes in configured entry order.
    pub entries: Vec<EntryReport>,
}

impl FetchReport {
    /// Number of entries fully materialized into the pack tree.
    #[must_use]
    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Synced { .. }))
    }

    /// Number of entries that could not be resolved.
    #[must_use]
    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::NotFound { .. }))
    }

    /// Number of entries that resolved but failed afterwards.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Run the fetch pipeline with production HTTP implementations.
///
/// # Errors
///
/// Returns [`FetchError`] only when the manifest cannot be written;
/// per-entry failures are recorded in the report instead.
pub fn run_fetch(
    sources: &SourceList,
    options: &FetchOptions,
    stderr: &mut dyn Write,
) -> Result<FetchReport, FetchError> {
    let progress = ProgressReporter::new(!options.quiet);
    run_fetch_with(
        sources,
        options,
        &HttpReleaseResolver,
        &HttpAssetFetcher::new(progress),
        stderr,
    )
}

/// Testable inner pipeline with injected resolver and fetcher.
///
/// The production entry point [`run_fetch`] delegates here with real
/// implementations; tests inject mocks.
///
/// # Errors
///
/// Returns [`FetchError`] only when the manifest cannot be written.
pub fn run_fetch_with(
    sources: &SourceList,
    options: &FetchOptions,
    resolver: &dyn ReleaseResolver,
    fetcher: &dyn AssetFetcher,
    stderr: &mut dyn Write,
) -> Result<FetchReport, FetchError> {
    let cache = DownloadCache::new(options.downloads_dir.clone());
    let mut entries = Vec::with_capacity(sources.len());
    let mut rows = Vec::with_capacity(sources.len());

    for (name, spec) in sources {
        let outcome = sync_entry(name, spec, options, &cache, resolver, fetcher, stderr);
        rows.push(ManifestRow {
            name: name.clone(),
            url: spec.url.clone(),
            file_type: spec.file_type.clone(),
            version: manifest_version(&outcome),
        });
        entries.push(EntryReport {
            name: name.clone(),
            outcome,
        });
    }

    Manifest::new(rows)
        .write(&options.manifest_path)
        .map_err(|source| FetchError::ManifestWrite {
            path: options.manifest_path.clone(),
            source,
        })?;

    Ok(FetchReport { entries })
}

/// Resolve, download, and materialize one entry.
///
/// Never returns an error: every failure is narrated and folded into the
/// entry's outcome so the caller can continue with the rest.
fn sync_entry(
    name: &str,
    spec: &SourceSpec,
    options: &FetchOptions,
    cache: &DownloadCache,
    resolver: &dyn ReleaseResolver,
    fetcher: &dyn AssetFetcher,
    stderr: &mut dyn Write,
) -> EntryOutcome {
    let release = match resolver.latest_release(&spec.url) {
        Ok(release) => release,
        Err(e) => {
            write_stderr_line(stderr, format!("{name}: {e}"));
            return EntryOutcome::NotFound {
                reason: e.to_string(),
            };
        }
    };

    let Some(asset) = select_asset(&release, &spec.file_type) else {
        let reason = format!(
            "no {} asset in the latest release of {}",
            spec.file_type, spec.url
        );
        write_stderr_line(stderr, format!("{name}: {reason}"));
        return EntryOutcome::NotFound { reason };
    };

    if !options.quiet {
        write_stderr_line(
            stderr,
            format!("{name}: {} ({})", asset.version, asset.file_name),
        );
    }

    let downloaded = match cache.ensure(&asset.file_name, &asset.download_url, fetcher) {
        Ok(downloaded) => downloaded,
        Err(e) => {
            write_stderr_line(stderr, format!("{name}: {e}"));
            return EntryOutcome::Failed {
                version: asset.version,
                reason: e.to_string(),
            };
        }
    };
    if downloaded.from_cache && !options.quiet {
        write_stderr_line(
            stderr,
            format!("{name}: {} already downloaded, skipping transfer", asset.file_name),
        );
    }

    let kind = ArchiveKind::from_declared(&spec.file_type);
    let materialize_spec = MaterializeSpec {
        pack_dir: &options.pack_dir,
        subdir: spec.extract_folder.as_deref(),
        rename_to: spec.rename_to.as_deref(),
        copy_to: spec.copy_to.as_deref(),
    };
    match materialize(&downloaded.path, kind, &materialize_spec) {
        Ok(()) => EntryOutcome::Synced {
            version: asset.version,
            from_cache: downloaded.from_cache,
        },
        Err(e) => {
            write_stderr_line(stderr, format!("{name}: {e}"));
            EntryOutcome::Failed {
                version: asset.version,
                reason: e.to_string(),
            }
        }
    }
}

/// The manifest version column for an outcome.
///
/// Entries that resolved keep their version even when a later stage
/// failed; only unresolved entries show the not-found sentinel.
fn manifest_version(outcome: &EntryOutcome) -> ResolvedVersion {
    match outcome {
        EntryOutcome::Synced { version, .. } | EntryOutcome::Failed { version, .. } => {
            ResolvedVersion::Tag(version.clone())
        }
        EntryOutcome::NotFound { .. } => ResolvedVersion::NotFound,
    }
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
