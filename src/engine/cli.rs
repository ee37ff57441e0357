//! CLI command handler: parse the listing, then harvest; --dry-run only lists what would be fetched.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::fetch::{CommandFetcher, run_command};
use crate::engine::sender::{DocumentSender, JsonLinesSender, LogSender};
use crate::listing::{DirTree, parse_listing};
use crate::pipeline::{Capabilities, Coordinator, summarize_report};
use crate::utils::harvest_toml::{apply_file_to_opts, load_harvest_toml};
use crate::utils::setup_logging;

/// Defaults, then `.textharvest.toml` from the working directory, then CLI flags.
fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_harvest_toml(Path::new(".")) {
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    setup_logging(opts.verbose);
    opts
}

fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    if let Some(ref root) = cli.root {
        opts.root_name = root.clone();
    }
    if !cli.extensions.is_empty() {
        opts.parse.extension_whitelist = cli.extensions.clone();
    }
    if !cli.allowed_paths.is_empty() {
        opts.parse.allowed_path_fragments = cli.allowed_paths.clone();
    }
    if let Some(own) = cli.own_handles {
        opts.parse.file_handle_inherits_parent = !own;
    }
    if let Some(ref dir) = cli.download_dir {
        opts.pipeline.download_dir = dir.clone();
    }
    if let Some(n) = cli.concurrency {
        opts.pipeline.max_concurrency = n;
    }
    if let Some(n) = cli.pool_size {
        opts.pipeline.pool_size = n;
    }
    if let Some(n) = cli.max_file_mib {
        opts.pipeline.max_file_mib = n;
    }
    if !cli.fetch_cmd.is_empty() {
        opts.fetch_command = cli.fetch_cmd.clone();
    }
    if !cli.listing_cmd.is_empty() {
        opts.listing_command = cli.listing_cmd.clone();
    }
    if cli.output.is_some() {
        opts.output = cli.output.clone();
    }
    if let Some(strict) = cli.strict {
        opts.strict = strict;
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }
    opts.pipeline.verbose = opts.verbose;
}

/// Listing text from a file, stdin, or the listing command.
async fn read_listing(cli: &Cli, opts: &Opts) -> Result<String> {
    if cli.listing_from_stdin() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read listing from stdin")?;
        return Ok(text);
    }
    if let Some(ref path) = cli.listing {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read listing {}", path.display()));
    }
    let (program, args) = opts
        .listing_command
        .split_first()
        .context("listing command is empty")?;
    debug!("Running listing command: {:?}", opts.listing_command);
    run_command(program, args, &[]).await
}

async fn build_capabilities(opts: &Opts) -> Result<Capabilities> {
    let fetcher = Arc::new(CommandFetcher::from_command(&opts.fetch_command)?);
    let sender: Arc<dyn DocumentSender> = match opts.output {
        Some(ref path) => {
            info!("Writing extracted text to {}", path.display());
            Arc::new(JsonLinesSender::create(path).await?)
        }
        None => Arc::new(LogSender),
    };
    Ok(Capabilities::new(fetcher, sender))
}

fn print_dry_run(tree: &DirTree) {
    let mut count = 0usize;
    for file in tree.files() {
        println!("{}", file.absolute_name());
        count += 1;
    }
    info!("{} files would be downloaded", count);
}

/// Run the harvest (default) or list the selected files when --dry-run.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    debug!("Options: {:#?}", opts);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build async runtime")?;

    let listing = runtime.block_on(read_listing(cli, &opts))?;
    let tree = parse_listing(&opts.root_name, &listing, &opts.parse);
    if cli.print_tree {
        print!("{}", tree.pretty());
    }
    if cli.dry_run {
        warn!("RUNNING IN DRY-RUN MODE. NOTHING WILL BE DOWNLOADED.");
        print_dry_run(&tree);
        return Ok(());
    }

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let report = runtime.block_on(async {
        let caps = build_capabilities(&opts).await?;
        Coordinator::with_cancel(tree.file_list(), &opts.pipeline, caps, cancel_requested)
            .start()
            .await
    })?;
    summarize_report(&report, opts.strict, opts.verbose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "textharvest",
            "listing.txt",
            "--root",
            "Drive",
            "-e",
            ".pdf",
            ".txt",
            "--own-handles",
            "-p",
            "2",
            "--strict",
        ]);
        let mut opts = Opts::default();
        apply_cli_to_opts(&cli, &mut opts);
        assert_eq!(opts.root_name, "Drive");
        assert_eq!(opts.parse.extension_whitelist, vec![".pdf", ".txt"]);
        assert!(!opts.parse.file_handle_inherits_parent);
        assert_eq!(opts.pipeline.pool_size, 2);
        assert!(opts.strict);
        assert!(!opts.verbose);
        assert!(!cli.listing_from_stdin());
    }

    #[test]
    fn unset_flags_keep_file_values() {
        let cli = Cli::parse_from(["textharvest", "-"]);
        let mut opts = Opts::default();
        opts.pipeline.max_file_mib = 7;
        opts.strict = true;
        apply_cli_to_opts(&cli, &mut opts);
        assert_eq!(opts.pipeline.max_file_mib, 7);
        assert!(opts.strict);
        assert!(cli.listing_from_stdin());
    }
}
