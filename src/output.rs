//! Human-facing output for the packsync binaries.
//!
//! Both binaries narrate their progress on stderr so that stdout stays free
//! for anything a wrapper script might want to capture. Writes are
//! best-effort; a broken pipe never turns into a second error.

use camino::Utf8Path;
use std::fmt::Display;
use std::io::Write;

/// Write a single line to the given stderr sink, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the end-of-run summary for the fetcher.
#[must_use]
pub fn fetch_summary(synced: usize, missing: usize, failed: usize, pack_dir: &Utf8Path) -> String {
    let plural = if synced == 1 { "entry" } else { "entries" };
    let mut summary = format!("Synced {synced} {plural} into {pack_dir}");
    if missing > 0 {
        summary.push_str(&format!(", {missing} not found"));
    }
    if failed > 0 {
        summary.push_str(&format!(", {failed} failed"));
    }
    summary
}

/// Format the success message printed after a release upload.
#[must_use]
pub fn publish_summary(tag: &str, asset_name: &str) -> String {
    format!("Uploaded {asset_name} to release {tag}")
}
