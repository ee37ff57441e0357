//! Textharvest: parse a remote file listing, download the selected files and extract their text

pub mod engine;
pub mod extract;
pub mod listing;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;

use crate::listing::parse_listing;
use crate::pipeline::{Capabilities, Coordinator};

/// Result alias used by public textharvest API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: parse `listing` under `root_name`, then download and extract every kept file.
///
/// `caps` supplies the fetcher and sender (and optionally a custom dispatch table or extraction kit).
/// Per-file failures are reported in the returned [`HarvestReport`]; `Err` means the pipeline itself broke.
///
/// ```ignore
/// let caps = Capabilities::new(Arc::new(my_fetcher), Arc::new(LogSender));
/// let report = textharvest::harvest(&listing, "CS", &ParseSettings::default(), &PipelineOpts::default(), caps).await?;
/// assert_eq!(report.accounted(), report.seeded);
/// ```
pub async fn harvest(
    listing: &str,
    root_name: &str,
    settings: &ParseSettings,
    opts: &PipelineOpts,
    caps: Capabilities,
) -> Result<HarvestReport> {
    let config_str = format!(
        "{} CONFIG:{:#?} {:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        settings,
        opts
    );
    debug!("{}", config_str);

    let tree = parse_listing(root_name, listing, settings);
    Coordinator::new(tree.file_list(), opts, caps).start().await
}
