use anyhow::Result;
use log::{info, warn};

use crate::{FailureStage, HarvestReport, SkipReason};

/// Log the run summary. Call once the coordinator has returned.
/// With `strict`, any lost file turns into an error (after the whole batch has run).
pub fn summarize_report(report: &HarvestReport, strict: bool, verbose: bool) -> Result<()> {
    info!(
        "Done: {} seeded, {} downloaded, {} extracted, {} sent",
        report.seeded, report.fetched, report.extracted, report.sent
    );
    if report.accounted() != report.seeded {
        warn!(
            "{} files unaccounted for ({} seeded, {} accounted)",
            report.seeded.abs_diff(report.accounted()),
            report.seeded,
            report.accounted()
        );
    }

    let skipped = report.skipped.len();
    if skipped > 0 {
        let oversize = report
            .skipped
            .iter()
            .filter(|s| s.reason == SkipReason::Oversize)
            .count();
        info!(
            "Skipped {} files ({} oversize, {} without a handler)",
            skipped,
            oversize,
            skipped - oversize
        );
    }

    if report.failures.is_empty() {
        return Ok(());
    }
    warn!(
        "Lost {} files: {} fetch, {} extract, {} send, {} cancelled, {} worker",
        report.failures.len(),
        report.failures_in(FailureStage::Fetch),
        report.failures_in(FailureStage::Extract),
        report.failures_in(FailureStage::Send),
        report.failures_in(FailureStage::Cancelled),
        report.failures_in(FailureStage::Worker),
    );
    if verbose {
        for f in &report.failures {
            eprintln!("  {:?}: {} ({})", f.stage, f.path, f.reason);
        }
    }
    if strict {
        return Err(anyhow::anyhow!(
            "strict mode: {} files failed",
            report.failures.len()
        ));
    }
    Ok(())
}
