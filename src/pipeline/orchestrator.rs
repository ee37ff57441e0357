use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

use crate::engine::progress::{download_bar, finish_bar};
use crate::utils::config::ProgressConsts;
use crate::{FailureStage, HarvestReport, PipelineOpts, TreeNode, WorkItem};

use super::context::{Capabilities, PipelineContext, PipelineTuning};
use super::download::spawn_download_workers;
use super::extraction::ExtractionStage;

/// Owns both queues and the shared semaphore; wires download → extraction → sender.
pub struct Coordinator {
    files: Vec<TreeNode>,
    ctx: Arc<PipelineContext>,
    caps: Capabilities,
}

impl Coordinator {
    /// `files` are the File leaves to process (see [`DirTree::file_list`](crate::listing::DirTree::file_list)).
    pub fn new(files: Vec<TreeNode>, opts: &PipelineOpts, caps: Capabilities) -> Self {
        Self::with_cancel(files, opts, caps, Arc::new(AtomicBool::new(false)))
    }

    /// Like [`new`](Self::new), with a flag that makes not-yet-started downloads give up.
    pub fn with_cancel(
        files: Vec<TreeNode>,
        opts: &PipelineOpts,
        caps: Capabilities,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        let tuning = PipelineTuning::from(opts);
        debug!("Pipeline tuning: {:?}", tuning);
        let progress = download_bar(opts.verbose, files.len(), ProgressConsts::DOWNLOAD_DESC);
        let ctx = Arc::new(PipelineContext::new(tuning, cancel, progress));
        Self { files, ctx, caps }
    }

    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.ctx
    }

    /// Run the whole batch: seed, download, extract, drain, shut down.
    /// Per-file failures land in the report; only pipeline-level faults return `Err`.
    pub async fn start(self) -> Result<HarvestReport> {
        let Self { files, ctx, caps } = self;
        let seeded = files.len();

        create_local_dirs(&ctx.tuning.download_dir, &files).await?;

        for file in files {
            ctx.download_queue.put(file);
        }
        info!("Seeded {} files", seeded);

        let mut extraction: JoinHandle<Result<()>> =
            tokio::spawn(ExtractionStage::new(Arc::clone(&ctx), &caps).run());
        let workers = spawn_download_workers(&ctx, &caps.fetcher, seeded);

        ctx.download_queue.join().await;
        debug!("download queue drained");

        ctx.processing_queue.put(WorkItem::EndOfStream);
        // a stage that died early would never acknowledge its items
        let stage_exit = tokio::select! {
            biased;
            _ = ctx.processing_queue.join() => None,
            exit = &mut extraction => Some(exit),
        };
        debug!("processing queue drained");

        shutdown_download_workers(&ctx, workers).await;
        let exit = match stage_exit {
            Some(exit) => exit,
            None => extraction.await,
        };
        exit.context("extraction stage panicked")?
            .context("extraction stage failed")?;

        if let Some(pb) = &ctx.progress {
            finish_bar(pb, ctx.counters.downloaded.load(Ordering::Relaxed));
        }
        Ok(collect_report(&ctx, seeded))
    }
}

/// Create every distinct parent directory of the download destinations.
async fn create_local_dirs(download_dir: &std::path::Path, files: &[TreeNode]) -> Result<()> {
    let dirs: BTreeSet<PathBuf> = files
        .iter()
        .filter_map(|f| download_dir.join(f.absolute_name()).parent().map(PathBuf::from))
        .collect();
    for dir in &dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create local dir {}", dir.display()))?;
    }
    debug!("Created {} local directories", dirs.len());
    Ok(())
}

/// Abort download workers (no-op for finished ones) and wait for them. Panics are recorded, not raised.
async fn shutdown_download_workers(ctx: &PipelineContext, workers: Vec<JoinHandle<()>>) {
    for handle in &workers {
        handle.abort();
    }
    for handle in workers {
        match handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                warn!("download worker failed: {}", e);
                ctx.record_failure("<download worker>", FailureStage::Worker, e);
            }
        }
    }
}

fn collect_report(ctx: &PipelineContext, seeded: usize) -> HarvestReport {
    HarvestReport {
        seeded,
        fetched: ctx.counters.downloaded.load(Ordering::Relaxed),
        extracted: ctx.counters.extracted.load(Ordering::Relaxed),
        sent: ctx.counters.sent.load(Ordering::Relaxed),
        skipped: ctx
            .skipped
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default(),
        failures: ctx
            .failures
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default(),
    }
}
