//! Progress reporting for downloads, packaging, and uploads.
//!
//! Thin facade over `indicatif` so the rest of the crate never touches bar
//! templates directly. When quiet mode is on, every constructor returns a
//! hidden bar and the call sites need no branching.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;

/// Creates progress bars for the current run.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    enabled: bool,
}

impl ProgressReporter {
    /// Create a reporter; pass `false` to suppress all bars.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A byte-counting bar for a transfer of `total` bytes, or a byte
    /// spinner when the size is unknown.
    #[must_use]
    pub fn bytes_bar(&self, name: &str, total: Option<u64>) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = match total {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                        .expect("static template is valid")
                        .progress_chars("#>-"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {msg} {bytes}")
                        .expect("static template is valid"),
                );
                pb
            }
        };
        pb.set_message(name.to_owned());
        pb
    }

    /// A count-based bar for an operation over `total` items.
    #[must_use]
    pub fn count_bar(&self, name: &str, total: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("static template is valid")
                .progress_chars("#>-"),
        );
        pb.set_message(name.to_owned());
        pb
    }
}

/// A [`Read`] adapter that advances a progress bar as bytes flow through.
///
/// Used for both directions: wrapping a response body while it streams to
/// disk, and wrapping a file while it streams to an upload request.
pub struct ProgressReader<R> {
    inner: R,
    bar: ProgressBar,
}

impl<R: Read> ProgressReader<R> {
    /// Wrap `inner`, ticking `bar` by the number of bytes read.
    pub fn new(inner: R, bar: ProgressBar) -> Self {
        Self { inner, bar }
    }

    /// Finish the bar and return the wrapped reader.
    pub fn finish(self) -> R {
        self.bar.finish_and_clear();
        self.inner
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bar.inc(n as u64);
        Ok(n)
    }
}
