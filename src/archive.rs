//! Artifact extraction and normalization into the pack tree.
//!
//! Each downloaded asset is materialized according to its declared archive
//! kind: zip and tar variants are unpacked (optionally restricted to a
//! sub-path), anything else is copied verbatim. Entry paths are validated
//! against traversal outside the destination before anything is written.

use camino::{Utf8Path, Utf8PathBuf};
use std::io::Read;
use std::path::{Component, Path};

/// The closed set of archive kinds packsync knows how to materialize.
///
/// Parsed from the `file_type` string declared in `links.json`. Anything
/// unrecognized is [`ArchiveKind::Raw`] and copied without decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A `.zip` archive.
    Zip,
    /// A gzip-compressed tarball.
    TarGz,
    /// An xz-compressed tarball.
    TarXz,
    /// A zstd-compressed tarball.
    TarZst,
    /// Not an archive; the asset is copied as a single file.
    Raw,
}

impl ArchiveKind {
    /// Map a declared file-type string to an archive kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use packsync::archive::ArchiveKind;
    ///
    /// assert_eq!(ArchiveKind::from_declared("tar.gz"), ArchiveKind::TarGz);
    /// assert_eq!(ArchiveKind::from_declared("AppImage"), ArchiveKind::Raw);
    /// ```
    #[must_use]
    pub fn from_declared(file_type: &str) -> Self {
        match file_type {
            "zip" => Self::Zip,
            "tar.gz" => Self::TarGz,
            "tar.xz" => Self::TarXz,
            "tar.zst" => Self::TarZst,
            _ => Self::Raw,
        }
    }

    /// Whether this kind is unpacked rather than copied.
    #[must_use]
    pub fn is_archive(self) -> bool {
        !matches!(self, Self::Raw)
    }
}

/// Destination parameters for materializing one artifact.
#[derive(Debug, Clone, Copy)]
pub struct MaterializeSpec<'a> {
    /// Root of the unified pack tree.
    pub pack_dir: &'a Utf8Path,
    /// Archive sub-path to extract; entries outside it are skipped and the
    /// prefix is stripped from extracted paths.
    pub subdir: Option<&'a str>,
    /// New name for the extracted sub-path's top-level file, or for a raw
    /// copy.
    pub rename_to: Option<&'a str>,
    /// Copy destination for raw assets, overriding the pack root.
    pub copy_to: Option<&'a Utf8Path>,
}

/// Errors arising from artifact materialization.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The file is not a valid archive of its declared kind.
    #[error("archive {path} is not valid: {reason}")]
    Invalid {
        /// The offending artifact.
        path: Utf8PathBuf,
        /// The underlying decode error.
        reason: String,
    },

    /// An entry path attempts to escape the destination directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// I/O error writing extracted content.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Materialize a downloaded artifact into the pack tree.
///
/// Dispatches on `kind`: archives are extracted under
/// [`MaterializeSpec::pack_dir`], raw assets are copied to
/// [`MaterializeSpec::copy_to`] (or the pack root) under their rename
/// target or original name.
///
/// # Errors
///
/// Returns [`ArchiveError::Invalid`] for a corrupt archive,
/// [`ArchiveError::PathTraversal`] for an escaping entry path, and
/// [`ArchiveError::Io`] on filesystem failures. Errors are scoped to this
/// artifact; callers continue with their remaining entries.
pub fn materialize(
    artifact: &Utf8Path,
    kind: ArchiveKind,
    spec: &MaterializeSpec<'_>,
) -> Result<(), ArchiveError> {
    if kind.is_archive() {
        std::fs::create_dir_all(spec.pack_dir)?;
    }
    match kind {
        ArchiveKind::Zip => extract_zip(artifact, spec),
        ArchiveKind::TarGz => {
            let file = std::fs::File::open(artifact)?;
            extract_tar(flate2::read::GzDecoder::new(file), artifact, spec)
        }
        ArchiveKind::TarXz => {
            let file = std::fs::File::open(artifact)?;
            extract_tar(xz2::read::XzDecoder::new(file), artifact, spec)
        }
        ArchiveKind::TarZst => {
            let file = std::fs::File::open(artifact)?;
            let decoder = zstd::Decoder::new(file)?;
            extract_tar(decoder, artifact, spec)
        }
        ArchiveKind::Raw => copy_raw(artifact, spec),
    }
}

/// Extract a zip archive, honouring the sub-path and rename rules.
fn extract_zip(artifact: &Utf8Path, spec: &MaterializeSpec<'_>) -> Result<(), ArchiveError> {
    let file = std::fs::File::open(artifact)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| invalid(artifact, &e))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| invalid(artifact, &e))?;
        let Some(rel) = entry_destination(entry.name(), spec.subdir) else {
            continue;
        };
        validate_entry_path(Path::new(&rel))?;

        let dest = spec.pack_dir.join(&rel);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
        apply_rename(&dest, &rel, spec)?;
    }
    Ok(())
}

/// Extract a tar stream, honouring the sub-path and rename rules.
///
/// Shared by every tar variant; the caller supplies the decompressor.
fn extract_tar<R: Read>(
    reader: R,
    artifact: &Utf8Path,
    spec: &MaterializeSpec<'_>,
) -> Result<(), ArchiveError> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().map_err(|e| invalid(artifact, &e))?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| invalid(artifact, &e))?;
        let raw_path = entry
            .path()
            .map_err(|e| invalid(artifact, &e))?
            .to_string_lossy()
            .into_owned();
        let Some(rel) = entry_destination(&raw_path, spec.subdir) else {
            continue;
        };
        validate_entry_path(Path::new(&rel))?;

        let dest = spec.pack_dir.join(&rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let is_file = entry.header().entry_type().is_file();
        entry.unpack(dest.as_std_path())?;
        if is_file {
            apply_rename(&dest, &rel, spec)?;
        }
    }
    Ok(())
}

/// Copy a non-archive asset verbatim to its destination.
fn copy_raw(artifact: &Utf8Path, spec: &MaterializeSpec<'_>) -> Result<(), ArchiveError> {
    let dest_dir = spec.copy_to.unwrap_or(spec.pack_dir);
    std::fs::create_dir_all(dest_dir)?;

    let name = match spec.rename_to {
        Some(name) => name,
        None => artifact.file_name().ok_or_else(|| ArchiveError::Invalid {
            path: artifact.to_owned(),
            reason: "artifact path has no file name".to_owned(),
        })?,
    };
    std::fs::copy(artifact, dest_dir.join(name))?;
    Ok(())
}

/// Compute the in-tree destination for an archive entry name.
///
/// With no sub-path declared, every entry keeps its full name. With a
/// sub-path, only entries under `<subdir>/` survive, stripped of the
/// prefix; the sub-path root itself (empty after stripping) is skipped.
fn entry_destination(entry_name: &str, subdir: Option<&str>) -> Option<String> {
    match subdir {
        None => Some(entry_name.to_owned()),
        Some(subdir) => {
            let rest = entry_name.strip_prefix(subdir)?.strip_prefix('/')?;
            if rest.is_empty() {
                None
            } else {
                Some(rest.to_owned())
            }
        }
    }
}

/// Rename the just-extracted file when the narrow rename rule applies.
///
/// The rename fires only when a sub-path was declared and the stripped
/// entry name has no remaining directory component, i.e. the entry is the
/// sub-path's own top-level file. Nested entries are never renamed.
fn apply_rename(
    dest: &Utf8Path,
    rel: &str,
    spec: &MaterializeSpec<'_>,
) -> Result<(), ArchiveError> {
    if spec.subdir.is_none() {
        return Ok(());
    }
    let Some(new_name) = spec.rename_to else {
        return Ok(());
    };
    if rel.contains('/') {
        return Ok(());
    }
    std::fs::rename(dest, spec.pack_dir.join(new_name))?;
    Ok(())
}

/// Validate that an entry path does not escape the destination directory
/// via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ArchiveError> {
    if path.is_absolute() {
        return Err(ArchiveError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ArchiveError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Format a decode error as [`ArchiveError::Invalid`].
fn invalid(path: &Utf8Path, reason: &dyn std::fmt::Display) -> ArchiveError {
    ArchiveError::Invalid {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
