//! Release package creation.
//!
//! Archives the whole pack tree into a single zip whose entry names are
//! paths relative to the tree root. Zip headers cannot represent times
//! before 1980, so any file older than that has its modification time
//! rewritten to the current time before it is added.

use crate::progress::ProgressReporter;
use crate::timestamp;
use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zip::write::SimpleFileOptions;

/// Seconds between the Unix epoch and 1 Jan 1980, the earliest timestamp
/// the zip format can store.
pub const ZIP_EPOCH_SECS: u64 = 315_532_800;

/// Errors arising from release package creation.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The source path is not a directory.
    #[error("pack directory {path} does not exist or is not a directory")]
    NotADirectory {
        /// The missing or non-directory path.
        path: Utf8PathBuf,
    },

    /// The zip writer rejected an operation.
    #[error("cannot write archive {path}: {reason}")]
    Zip {
        /// The archive being written.
        path: Utf8PathBuf,
        /// Description of the zip failure.
        reason: String,
    },

    /// I/O error reading the tree or writing the archive.
    #[error("packaging I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of a packaging run.
#[derive(Debug, Clone)]
pub struct PackageOutput {
    /// Path of the created archive.
    pub archive_path: Utf8PathBuf,
    /// Number of files added to the archive.
    pub file_count: usize,
    /// Lowercase hex SHA-256 digest of the finished archive.
    pub sha256: String,
}

/// Archive the full recursive contents of `source_dir` into `output_zip`.
///
/// Entry names are relative to `source_dir`. Progress is reported by file
/// count. Files with a pre-1980 modification time are touched to "now"
/// first; this mutates the source tree, as an unavoidable side effect of
/// the archive format's timestamp floor.
///
/// # Errors
///
/// Returns [`PackageError::NotADirectory`] when `source_dir` is not a
/// directory, and [`PackageError::Zip`] / [`PackageError::Io`] on archive
/// or filesystem failures.
pub fn package_tree(
    source_dir: &Utf8Path,
    output_zip: &Utf8Path,
    progress: ProgressReporter,
) -> Result<PackageOutput, PackageError> {
    if !source_dir.is_dir() {
        return Err(PackageError::NotADirectory {
            path: source_dir.to_owned(),
        });
    }

    let files = collect_files(source_dir)?;
    let bar = progress.count_bar("Packaging", files.len() as u64);

    let output_file = std::fs::File::create(output_zip)?;
    let mut writer = zip::ZipWriter::new(output_file);

    for (path, entry_name) in &files {
        let mtime = normalize_mtime(path);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip_datetime(mtime));
        writer
            .start_file(entry_name.as_str(), options)
            .map_err(|e| zip_error(output_zip, &e))?;
        let mut source = std::fs::File::open(path)?;
        std::io::copy(&mut source, &mut writer)?;
        bar.inc(1);
    }

    writer.finish().map_err(|e| zip_error(output_zip, &e))?;
    bar.finish_and_clear();

    let sha256 = compute_sha256(output_zip)?;
    Ok(PackageOutput {
        archive_path: output_zip.to_owned(),
        file_count: files.len(),
        sha256,
    })
}

/// Walk `source_dir` and return `(absolute path, archive entry name)`
/// pairs for every regular file, in a deterministic order.
fn collect_files(source_dir: &Utf8Path) -> Result<Vec<(Utf8PathBuf, String)>, PackageError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(|p| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("non-UTF-8 path in pack tree: {}", p.display()),
            )
        })?;
        let entry_name = path
            .strip_prefix(source_dir)
            .map_or_else(|_| path.as_str().to_owned(), |rel| rel.as_str().to_owned());
        files.push((path, entry_name));
    }
    Ok(files)
}

/// Return the modification time to record for `path`, rewriting it to the
/// current time first when it predates the zip epoch.
///
/// The rewrite is best-effort: if the touch fails the current time is
/// still used for the archive header, which keeps the entry encodable.
fn normalize_mtime(path: &Utf8Path) -> SystemTime {
    let zip_epoch = UNIX_EPOCH + Duration::from_secs(ZIP_EPOCH_SECS);
    let mtime = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(zip_epoch);
    if mtime >= zip_epoch {
        return mtime;
    }

    let now = SystemTime::now();
    let touched = std::fs::File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(now));
    if let Err(e) = touched {
        log::debug!("cannot update pre-1980 mtime on {path}: {e}");
    }
    now
}

/// Convert a modification time to a zip header timestamp.
///
/// Times the format cannot represent fall back to the zip epoch.
fn zip_datetime(mtime: SystemTime) -> zip::DateTime {
    let Ok(elapsed) = mtime.duration_since(UNIX_EPOCH) else {
        return zip::DateTime::default();
    };
    let secs = elapsed.as_secs();
    let (year, month, day) = timestamp::civil_from_epoch(secs);
    let (hour, minute, second) = timestamp::time_of_day(secs);
    zip::DateTime::from_date_and_time(
        year as u16,
        month as u8,
        day as u8,
        hour as u8,
        minute as u8,
        second as u8,
    )
    .unwrap_or_default()
}

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// Reads the file in chunks so large archives never sit in memory whole.
///
/// # Errors
///
/// Returns [`PackageError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<String, PackageError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Format a zip failure as [`PackageError::Zip`].
fn zip_error(path: &Utf8Path, reason: &dyn std::fmt::Display) -> PackageError {
    PackageError::Zip {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;
