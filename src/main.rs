//! Textharvest CLI: fetch a listing, download the matching files, extract their text.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use textharvest::engine::arg_parser::Cli;
use textharvest::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
