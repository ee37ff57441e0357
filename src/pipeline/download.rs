//! Download stage: one task per seeded file, gated by the shared semaphore.

use log::{debug, error};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::engine::fetch::Fetcher;
use crate::engine::progress::update_progress_bar;
use crate::{FailureStage, WorkItem};

use super::context::{PipelineContext, PipelineCounters};

/// Single download worker: take one file off the download queue, fetch it, forward it for extraction.
/// The queue item is acknowledged on every path out of this function.
async fn download_worker(ctx: Arc<PipelineContext>, fetcher: Arc<dyn Fetcher>) {
    let Ok(_permit) = Arc::clone(&ctx.semaphore).acquire_owned().await else {
        return;
    };
    let Some((node, _done)) = ctx.download_queue.get().await else {
        return;
    };

    if ctx.is_cancelled() {
        debug!("cancelled before fetch: {}", node.absolute_name());
        ctx.record_failure(node.absolute_name(), FailureStage::Cancelled, "cancelled");
        return;
    }

    let remote = node.path_without_root();
    let local = ctx.local_path(&node);
    match fetcher.fetch(remote, &local).await {
        Ok(()) => {
            debug!("downloaded {} to {}", remote, local.display());
            PipelineCounters::bump(&ctx.counters.downloaded);
            if let Some(pb) = &ctx.progress {
                update_progress_bar(pb, 1);
            }
            ctx.processing_queue.put(WorkItem::File(node));
        }
        Err(e) => {
            error!("Error downloading {}: {:#}", node.absolute_name(), e);
            ctx.record_failure(node.absolute_name(), FailureStage::Fetch, format!("{e:#}"));
        }
    }
}

/// Spawn `count` download workers. Each handles exactly one queue item.
pub fn spawn_download_workers(
    ctx: &Arc<PipelineContext>,
    fetcher: &Arc<dyn Fetcher>,
    count: usize,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|_| tokio::spawn(download_worker(Arc::clone(ctx), Arc::clone(fetcher))))
        .collect()
}
