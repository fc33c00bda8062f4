//! packsync publish CLI entrypoint.
//!
//! Archives the pack tree into a zip, creates a release on the target
//! repository with the manifest as notes, and uploads the archive as a
//! release asset. Unlike the fetcher, any failure here is fatal: a
//! half-published release is not a useful partial state.

use camino::Utf8PathBuf;
use clap::Parser;
use packsync::config::load_publish_config;
use packsync::error::Result;
use packsync::output::{publish_summary, write_stderr_line};
use packsync::package::package_tree;
use packsync::progress::ProgressReporter;
use packsync::publish::{HttpReleasePublisher, PublishPlan, publish_archive, release_notes};
use packsync::timestamp;
use std::io::Write;

/// Package the pack tree and publish it as a GitHub release.
#[derive(Parser, Debug)]
#[command(name = "packsync-publish")]
#[command(
    version,
    about = "Package the pack tree and publish it as a GitHub release"
)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Publish the default pack tree:\n",
    "    $ packsync-publish\n\n",
    "  Preview the tag and archive path without any side effects:\n",
    "    $ packsync-publish --dry-run\n\n",
    "  Publish under an explicit tag:\n",
    "    $ packsync-publish --tag v2025.08\n",
))]
struct PublishCli {
    /// Path to the repository/token configuration.
    #[arg(long, value_name = "FILE", default_value = "github.json")]
    config: Utf8PathBuf,

    /// Root of the pack tree to archive.
    #[arg(long, value_name = "DIR", default_value = "pack")]
    pack_dir: Utf8PathBuf,

    /// Path of the archive to create and upload.
    #[arg(long, value_name = "FILE", default_value = "pack.zip")]
    output: Utf8PathBuf,

    /// Manifest used as the release notes body.
    #[arg(long, value_name = "FILE", default_value = "README.md")]
    manifest: Utf8PathBuf,

    /// Tag (and title) for the release [default: Release-YYYYMMDD-hhmmss].
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,

    /// Show the derived tag and paths, then exit without packaging or
    /// publishing.
    #[arg(long)]
    dry_run: bool,

    /// Suppress progress bars and informational output (errors still
    /// shown).
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let cli = PublishCli::parse();
    let mut stderr = std::io::stderr();
    if let Err(err) = run(&cli, &mut stderr) {
        write_stderr_line(&mut stderr, format!("error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: &PublishCli, stderr: &mut dyn Write) -> Result<()> {
    let tag = match &cli.tag {
        Some(tag) => tag.clone(),
        None => timestamp::release_tag(timestamp::now_epoch_secs()?),
    };

    if cli.dry_run {
        print_dry_run_info(cli, &tag, stderr);
        return Ok(());
    }

    let progress = ProgressReporter::new(!cli.quiet);
    if !cli.quiet {
        write_stderr_line(stderr, format!("Packaging {} into {}...", cli.pack_dir, cli.output));
    }
    let package = package_tree(&cli.pack_dir, &cli.output, progress)?;
    if !cli.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Packaged {} file(s), sha256 {}",
                package.file_count, package.sha256
            ),
        );
    }

    let config = load_publish_config(&cli.config)?;
    let plan = PublishPlan {
        tag,
        notes: release_notes(&cli.manifest),
    };
    let publisher = HttpReleasePublisher::new(progress);
    let created = publish_archive(&publisher, &config, &plan, &package.archive_path, stderr)?;

    let asset_name = package.archive_path.file_name().unwrap_or("archive");
    write_stderr_line(stderr, publish_summary(&plan.tag, asset_name));
    if let Some(html_url) = created.html_url {
        write_stderr_line(stderr, html_url);
    }
    Ok(())
}

/// Print the configuration a real run would use, without side effects.
fn print_dry_run_info(cli: &PublishCli, tag: &str, stderr: &mut dyn Write) {
    write_stderr_line(stderr, "Dry run - nothing will be packaged or published");
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, format!("Tag: {tag}"));
    write_stderr_line(stderr, format!("Pack tree: {}", cli.pack_dir));
    write_stderr_line(stderr, format!("Archive: {}", cli.output));
    let notes_source = if cli.manifest.exists() {
        format!("Notes: {}", cli.manifest)
    } else {
        format!("Notes: placeholder ({} missing)", cli.manifest)
    };
    write_stderr_line(stderr, notes_source);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_the_directory_convention() {
        let cli = PublishCli::parse_from(["packsync-publish"]);
        assert_eq!(cli.config, "github.json");
        assert_eq!(cli.pack_dir, "pack");
        assert_eq!(cli.output, "pack.zip");
        assert_eq!(cli.manifest, "README.md");
        assert!(cli.tag.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn dry_run_reports_tag_and_paths_without_side_effects() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let cli = PublishCli::parse_from([
            "packsync-publish",
            "--dry-run",
            "--tag",
            "v1.0",
            "--pack-dir",
            root.join("pack").as_str(),
            "--output",
            root.join("pack.zip").as_str(),
            "--manifest",
            root.join("README.md").as_str(),
        ]);

        let mut stderr = Vec::new();
        run(&cli, &mut stderr).expect("dry run");

        let text = String::from_utf8(stderr).expect("stderr is UTF-8");
        assert!(text.contains("Tag: v1.0"));
        assert!(text.contains("Dry run"));
        assert!(!root.join("pack.zip").exists(), "dry run must not package");
    }

    #[test]
    fn explicit_tag_overrides_the_timestamp_tag() {
        let cli = PublishCli::parse_from(["packsync-publish", "--tag", "v2.0"]);
        assert_eq!(cli.tag.as_deref(), Some("v2.0"));
    }
}
