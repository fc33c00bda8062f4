//! CLI argument definitions for the fetch binary.
//!
//! Separated from the entrypoint so the binary stays focused on
//! orchestration. The publish binary carries its own small parser in its
//! bin file.

use crate::fetch::FetchOptions;
use camino::Utf8PathBuf;
use clap::Parser;

/// Sync the latest release assets of the configured sources into the pack
/// tree.
#[derive(Parser, Debug)]
#[command(name = "packsync-fetch")]
#[command(version, about)]
#[command(long_about = concat!(
    "Sync upstream GitHub release assets into a local pack tree.\n\n",
    "Each entry in links.json names an upstream repository, the asset ",
    "suffix to fetch, and how to place the asset in the tree. Assets are ",
    "cached in the downloads directory by file name; a cached file is ",
    "never re-downloaded. Every run rewrites the manifest with the ",
    "resolved versions, including entries that could not be resolved.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Sync everything declared in links.json:\n",
    "    $ packsync-fetch\n\n",
    "  Use a different tree and manifest location:\n",
    "    $ packsync-fetch --pack-dir dist/pack --manifest dist/README.md\n\n",
    "  Quiet run for cron or CI:\n",
    "    $ packsync-fetch --quiet\n",
))]
pub struct FetchCli {
    /// Path to the source declarations.
    #[arg(long, value_name = "FILE", default_value = "links.json")]
    pub links: Utf8PathBuf,

    /// Directory for the flat downloads cache.
    #[arg(long, value_name = "DIR", default_value = "downloads")]
    pub downloads_dir: Utf8PathBuf,

    /// Root of the unified pack tree.
    #[arg(long, value_name = "DIR", default_value = "pack")]
    pub pack_dir: Utf8PathBuf,

    /// Path of the generated manifest.
    #[arg(long, value_name = "FILE", default_value = "README.md")]
    pub manifest: Utf8PathBuf,

    /// Suppress progress bars and per-entry narration (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl FetchCli {
    /// Build the fetch pipeline options from the parsed arguments.
    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            downloads_dir: self.downloads_dir.clone(),
            pack_dir: self.pack_dir.clone(),
            manifest_path: self.manifest.clone(),
            quiet: self.quiet,
        }
    }
}
