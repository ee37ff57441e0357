//! Extraction stage: a single long-running task that feeds a fixed-size rayon pool.
//!
//! Batching: while fewer than `pool_size` extractions are outstanding the stage waits for
//! whichever comes first, the next queue item or the next completion. At `pool_size` it only
//! waits for completions. Results are forwarded to the sender as soon as they arrive.

use anyhow::{Context, Result, anyhow};
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, warn};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, oneshot};

use crate::engine::sender::DocumentSender;
use crate::extract::{Dispatch, DispatchTable, ExtractorKit, Handler};
use crate::{
    ExtractedDocument, FailureStage, ItemState, SkipReason, Skipped, TreeNode, WorkItem,
};

use super::context::{Capabilities, PipelineContext, PipelineCounters};
use super::queue::DoneGuard;

/// Outcome of one pool job. `id` is the submission's key in the tracked map.
struct Completion {
    id: u64,
    path: PathBuf,
    result: Result<String>,
}

/// Node waiting on its extraction. Owned by the stage task only.
struct Tracked {
    node: TreeNode,
    state: ItemState,
}

/// In-flight submissions keyed by a per-item id, so two items never share an entry.
#[derive(Default)]
struct TrackedMap {
    entries: HashMap<u64, Tracked>,
    next_id: u64,
}

impl TrackedMap {
    fn insert(&mut self, tracked: Tracked) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, tracked);
        id
    }
}

enum Event {
    Item(Option<(WorkItem, DoneGuard)>),
    Completed(Option<Completion>),
}

pub struct ExtractionStage {
    ctx: Arc<PipelineContext>,
    sender: Arc<dyn DocumentSender>,
    table: DispatchTable,
    kit: ExtractorKit,
}

impl ExtractionStage {
    pub fn new(ctx: Arc<PipelineContext>, caps: &Capabilities) -> Self {
        Self {
            ctx,
            sender: Arc::clone(&caps.sender),
            table: caps.table.clone(),
            kit: caps.kit.clone(),
        }
    }

    /// Consume the processing queue until end-of-stream, then wait out every outstanding extraction.
    /// The end-of-stream item is acknowledged last, so joining the queue waits for the drain.
    pub async fn run(self) -> Result<()> {
        let pool_size = self.ctx.tuning.pool_size;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size)
            .thread_name(|i| format!("extract-{i}"))
            .build()
            .context("build extraction pool")?;
        let mut in_flight: FuturesUnordered<BoxFuture<'static, Completion>> =
            FuturesUnordered::new();
        let mut tracked = TrackedMap::default();
        let mut end_of_stream: Option<DoneGuard> = None;

        loop {
            let event = if in_flight.len() >= pool_size {
                Event::Completed(in_flight.next().await)
            } else if in_flight.is_empty() {
                Event::Item(self.ctx.processing_queue.get().await)
            } else {
                tokio::select! {
                    Some(done) = in_flight.next() => Event::Completed(Some(done)),
                    item = self.ctx.processing_queue.get() => Event::Item(item),
                }
            };

            match event {
                Event::Completed(Some(done)) => self.finish(done, &mut tracked).await,
                Event::Completed(None) => {}
                Event::Item(None) => break,
                Event::Item(Some((WorkItem::EndOfStream, done))) => {
                    debug!("end of stream, draining {} extractions", in_flight.len());
                    end_of_stream = Some(done);
                    break;
                }
                Event::Item(Some((WorkItem::File(node), _done))) => {
                    if let Some(job) = self.accept(node, &pool, &mut tracked).await {
                        in_flight.push(job);
                    }
                }
            }
        }

        while let Some(done) = in_flight.next().await {
            self.finish(done, &mut tracked).await;
        }
        for (_, t) in tracked.entries.drain() {
            // only reachable if a completion went missing
            warn!("{} left in state {}", t.node.absolute_name(), t.state);
            self.ctx.record_failure(t.node.absolute_name(), FailureStage::Extract, "abandoned");
        }
        drop(end_of_stream);
        Ok(())
    }

    /// Received -> Dispatched, or skipped. Returns the submission to track.
    async fn accept(
        &self,
        node: TreeNode,
        pool: &rayon::ThreadPool,
        tracked: &mut TrackedMap,
    ) -> Option<BoxFuture<'static, Completion>> {
        let path = self.ctx.local_path(&node);
        debug!("{}: {}", node.absolute_name(), ItemState::Received);

        if let Ok(meta) = tokio::fs::metadata(&path).await
            && meta.len() > self.ctx.tuning.max_file_bytes
        {
            warn!(
                "Skipping {}: {} bytes exceeds limit of {}",
                node.absolute_name(),
                meta.len(),
                self.ctx.tuning.max_file_bytes
            );
            self.ctx.record_skip(Skipped {
                path: node.absolute_name().to_string(),
                reason: SkipReason::Oversize,
            });
            return None;
        }

        let handler = match self.table.resolve(&path) {
            Dispatch::Handler(handler) => handler,
            Dispatch::Unsupported(ext) => {
                warn!("No handler for file extension: {:?} ({})", ext, node.absolute_name());
                self.ctx.record_skip(Skipped {
                    path: node.absolute_name().to_string(),
                    reason: SkipReason::Unsupported,
                });
                return None;
            }
        };

        let permit = match Arc::clone(&self.ctx.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                self.ctx
                    .record_failure(node.absolute_name(), FailureStage::Worker, e);
                return None;
            }
        };

        let id = tracked.insert(Tracked {
            node,
            state: ItemState::Dispatched,
        });
        debug!("{}: {}", path.display(), ItemState::Dispatched);
        Some(submit(pool, handler, self.kit.clone(), id, path, permit))
    }

    /// Dispatched -> Completed | Failed. Completed documents go to the sender and leave the map.
    async fn finish(&self, done: Completion, tracked: &mut TrackedMap) {
        let Some(Tracked { node, .. }) = tracked.entries.remove(&done.id) else {
            error!("completion for untracked submission {}", done.path.display());
            self.ctx.record_failure(
                &done.path.display().to_string(),
                FailureStage::Extract,
                "untracked completion",
            );
            return;
        };
        let name = node.absolute_name().to_string();
        let state = match done.result {
            Ok(text) => {
                PipelineCounters::bump(&self.ctx.counters.extracted);
                let doc = ExtractedDocument { source: node, text };
                match self.sender.send(vec![doc]).await {
                    Ok(()) => {
                        PipelineCounters::bump(&self.ctx.counters.sent);
                    }
                    Err(e) => {
                        error!("Error sending {}: {:#}", name, e);
                        self.ctx
                            .record_failure(&name, FailureStage::Send, format!("{e:#}"));
                    }
                }
                ItemState::Completed
            }
            Err(e) => {
                error!("Error in completed task {}: {:#}", name, e);
                self.ctx
                    .record_failure(&name, FailureStage::Extract, format!("{e:#}"));
                ItemState::Failed
            }
        };
        debug!("{}: {}", name, state);
    }
}

/// Run `handler` on a pool thread. Panics are caught so one bad file can't take down the pool.
/// The permit is released on the pool thread when the handler returns, so a stage blocked on
/// acquiring another permit never waits on its own unpolled completions.
fn submit(
    pool: &rayon::ThreadPool,
    handler: Handler,
    kit: ExtractorKit,
    id: u64,
    path: PathBuf,
    permit: OwnedSemaphorePermit,
) -> BoxFuture<'static, Completion> {
    let (tx, rx) = oneshot::channel();
    let job_path = path.clone();
    pool.spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.run(&kit, &job_path)))
            .unwrap_or_else(|p| Err(anyhow!("handler panicked: {}", panic_message(p.as_ref()))));
        drop(permit);
        let _ = tx.send(result);
    });
    async move {
        let result = rx
            .await
            .unwrap_or_else(|_| Err(anyhow!("extraction job dropped")));
        Completion { id, path, result }
    }
    .boxed()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
