//! Configuration files for the two binaries.
//!
//! The fetcher reads `links.json`, an ordered map from entry name to source
//! declaration; the publisher reads `github.json` with the target repository
//! and token. Both loaders tolerate a leading UTF-8 byte-order mark, which
//! Windows editors like to prepend.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// One declared upstream project to sync.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    /// Repository page URL of the upstream project.
    pub url: String,
    /// Asset file-name suffix selecting which release asset to fetch, and
    /// the declared archive kind for extraction.
    #[serde(default = "default_file_type")]
    pub file_type: String,
    /// Archive sub-path to extract; entries outside it are ignored and the
    /// prefix is stripped from extracted paths.
    #[serde(default)]
    pub extract_folder: Option<String>,
    /// Destination directory for non-archive assets, overriding the pack
    /// tree root.
    #[serde(default)]
    pub copy_to: Option<Utf8PathBuf>,
    /// Name to give the extracted top-level file or copied asset.
    #[serde(default, alias = "Rename_to")]
    pub rename_to: Option<String>,
}

fn default_file_type() -> String {
    "zip".to_owned()
}

/// The fetcher's declared source entries, in configured order.
///
/// Manifest rows and processing order both follow the order entries appear
/// in `links.json`.
pub type SourceList = IndexMap<String, SourceSpec>;

/// Target repository and credential for the publisher.
#[derive(Clone, Deserialize)]
pub struct PublishConfig {
    /// Target repository as `owner/repo`.
    pub repository: String,
    /// API token authorizing release creation and asset upload.
    pub token: String,
}

impl fmt::Debug for PublishConfig {
    // The token never appears in logs or error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Errors loading or parsing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected shape.
    #[error("invalid configuration in {path}: {reason}")]
    Parse {
        /// Path of the malformed file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },
}

/// Load the fetcher's source list from `links.json`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read and
/// [`ConfigError::Parse`] if it is not a JSON object of source entries.
pub fn load_sources(path: &Utf8Path) -> Result<SourceList, ConfigError> {
    parse_config(path)
}

/// Load the publisher's repository and token from `github.json`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read and
/// [`ConfigError::Parse`] if it lacks the repository or token fields.
pub fn load_publish_config(path: &Utf8Path) -> Result<PublishConfig, ConfigError> {
    parse_config(path)
}

/// Read a JSON config file into `T`, stripping a UTF-8 BOM if present.
fn parse_config<T: for<'de> Deserialize<'de>>(path: &Utf8Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    serde_json::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const LINKS: &str = r#"{
        "tool-a": { "url": "https://github.com/a/a", "file_type": "tar.gz" },
        "tool-b": { "url": "https://github.com/b/b" },
        "tool-c": {
            "url": "https://github.com/c/c",
            "file_type": "exe",
            "copy_to": "pack/bin",
            "Rename_to": "c.exe"
        }
    }"#;

    fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> Utf8PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("write config");
        Utf8PathBuf::from_path_buf(path).expect("utf-8 temp path")
    }

    #[test]
    fn sources_preserve_declaration_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_config(&dir, "links.json", LINKS);
        let sources = load_sources(&path).expect("parse");
        let names: Vec<&str> = sources.keys().map(String::as_str).collect();
        assert_eq!(names, ["tool-a", "tool-b", "tool-c"]);
    }

    #[test]
    fn file_type_defaults_to_zip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_config(&dir, "links.json", LINKS);
        let sources = load_sources(&path).expect("parse");
        assert_eq!(sources["tool-b"].file_type, "zip");
    }

    #[test]
    fn legacy_rename_key_is_accepted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_config(&dir, "links.json", LINKS);
        let sources = load_sources(&path).expect("parse");
        assert_eq!(sources["tool-c"].rename_to.as_deref(), Some("c.exe"));
        assert_eq!(
            sources["tool-c"].copy_to.as_deref(),
            Some(Utf8Path::new("pack/bin"))
        );
    }

    #[rstest]
    #[case::plain("{\"repository\": \"o/r\", \"token\": \"t0ken\"}")]
    #[case::bom("\u{feff}{\"repository\": \"o/r\", \"token\": \"t0ken\"}")]
    fn publish_config_parses_with_and_without_bom(#[case] contents: &str) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_config(&dir, "github.json", contents);
        let config = load_publish_config(&path).expect("parse");
        assert_eq!(config.repository, "o/r");
        assert_eq!(config.token, "t0ken");
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let config = PublishConfig {
            repository: "o/r".to_owned(),
            token: "secret".to_owned(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = load_sources(Utf8Path::new("/nonexistent/links.json"))
            .expect_err("expected read failure");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_json_reports_parse_error_with_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_config(&dir, "links.json", "{not json");
        let err = load_sources(&path).expect_err("expected parse failure");
        assert!(err.to_string().contains("links.json"));
    }
}
