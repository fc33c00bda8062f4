//! packsync fetch CLI entrypoint.
//!
//! Reads the declared source list, syncs each entry's latest release asset
//! into the pack tree, and writes the manifest. Per-entry failures are
//! reported and the run continues; partial success is a normal outcome.

use clap::Parser;
use packsync::cli::FetchCli;
use packsync::config::load_sources;
use packsync::error::Result;
use packsync::fetch::run_fetch;
use packsync::output::{fetch_summary, write_stderr_line};
use std::io::Write;

fn main() {
    env_logger::init();
    let cli = FetchCli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &FetchCli, stderr: &mut dyn Write) -> Result<()> {
    let sources = load_sources(&cli.links)?;
    let report = run_fetch(&sources, &cli.fetch_options(), stderr)?;

    if !cli.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(
            stderr,
            fetch_summary(
                report.synced(),
                report.not_found(),
                report.failed(),
                &cli.pack_dir,
            ),
        );
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
