//! Manifest generation for a fetch run.
//!
//! The manifest is a markdown document listing every configured entry with
//! its resolved version (or a not-found marker). It doubles as the release
//! notes body when the pack is republished, so the rendering is plain
//! markdown with no tooling-specific syntax.

use camino::Utf8Path;
use std::fmt;

/// The version resolved for a source entry, or the not-found sentinel.
///
/// Entries that fail resolution keep a manifest row; they are never
/// silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVersion {
    /// The release tag the entry resolved to.
    Tag(String),
    /// The entry could not be resolved this run.
    NotFound,
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::NotFound => f.write_str("not found"),
        }
    }
}

/// One manifest row describing a configured entry.
#[derive(Debug, Clone)]
pub struct ManifestRow {
    /// Entry name from `links.json`.
    pub name: String,
    /// Upstream repository URL.
    pub url: String,
    /// Declared file type.
    pub file_type: String,
    /// Resolved version or the not-found sentinel.
    pub version: ResolvedVersion,
}

/// A rendered-on-demand manifest for one fetch run.
///
/// Pure data: rendering depends only on the rows, in the order given, so
/// two runs resolving identical versions produce identical documents.
#[derive(Debug, Clone)]
pub struct Manifest {
    rows: Vec<ManifestRow>,
}

impl Manifest {
    /// Create a manifest from rows in configured entry order.
    #[must_use]
    pub fn new(rows: Vec<ManifestRow>) -> Self {
        Self { rows }
    }

    /// The manifest rows.
    #[must_use]
    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    /// Render the manifest as markdown.
    #[must_use]
    pub fn render(&self) -> String {
        let mut doc = String::from("# Pack contents\n\n");
        for row in &self.rows {
            doc.push_str(&format!("- **{}**\n", row.name));
            doc.push_str(&format!("  - Repository: {}\n", row.url));
            doc.push_str(&format!("  - Type: {}\n", row.file_type));
            doc.push_str(&format!("  - Version: {}\n\n", row.version));
        }
        doc
    }

    /// Write the rendered manifest to `path`, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the write fails.
    pub fn write(&self, path: &Utf8Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }
}
