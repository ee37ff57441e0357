//! Pipeline context: queues, the shared semaphore, counters and collaborator handles
//! passed into both stages.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::engine::fetch::Fetcher;
use crate::engine::progress::ProgressBar;
use crate::engine::sender::DocumentSender;
use crate::extract::{DispatchTable, ExtractorKit};
use crate::utils::config::as_mib;
use crate::utils::fd_limit::cap_concurrency;
use crate::{Failure, FailureStage, PipelineOpts, Skipped, TreeNode, WorkItem};

use super::queue::WorkQueue;

/// Tuning resolved from [`PipelineOpts`] and the FD limit.
#[derive(Clone, Debug)]
pub struct PipelineTuning {
    pub permits: usize,
    pub pool_size: usize,
    pub max_file_bytes: u64,
    pub download_dir: PathBuf,
}

impl From<&PipelineOpts> for PipelineTuning {
    fn from(o: &PipelineOpts) -> Self {
        Self {
            permits: cap_concurrency(o.max_concurrency),
            pool_size: o.pool_size.max(1),
            max_file_bytes: as_mib(o.max_file_mib),
            download_dir: o.download_dir.clone(),
        }
    }
}

/// External collaborators: how to fetch, how to extract, where results go.
#[derive(Clone)]
pub struct Capabilities {
    pub fetcher: Arc<dyn Fetcher>,
    pub sender: Arc<dyn DocumentSender>,
    pub table: DispatchTable,
    pub kit: ExtractorKit,
}

impl Capabilities {
    /// Built-in dispatch table and extraction tools.
    pub fn new(fetcher: Arc<dyn Fetcher>, sender: Arc<dyn DocumentSender>) -> Self {
        Self {
            fetcher,
            sender,
            table: DispatchTable::default(),
            kit: ExtractorKit::default(),
        }
    }

    pub fn with_table(mut self, table: DispatchTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_kit(mut self, kit: ExtractorKit) -> Self {
        self.kit = kit;
        self
    }
}

/// Monotonic counters. `downloaded` drives the progress bar.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub downloaded: AtomicUsize,
    pub extracted: AtomicUsize,
    pub sent: AtomicUsize,
}

impl PipelineCounters {
    pub fn bump(counter: &AtomicUsize) -> usize {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// State shared by the coordinator and both stages. Built once per run; nothing global.
pub struct PipelineContext {
    pub tuning: PipelineTuning,
    pub download_queue: WorkQueue<TreeNode>,
    pub processing_queue: WorkQueue<WorkItem>,
    pub semaphore: Arc<Semaphore>,
    pub counters: PipelineCounters,
    pub failures: Mutex<Vec<Failure>>,
    pub skipped: Mutex<Vec<Skipped>>,
    pub cancel: Arc<AtomicBool>,
    pub progress: Option<ProgressBar>,
}

impl PipelineContext {
    pub fn new(tuning: PipelineTuning, cancel: Arc<AtomicBool>, progress: Option<ProgressBar>) -> Self {
        let semaphore = Arc::new(Semaphore::new(tuning.permits));
        Self {
            tuning,
            download_queue: WorkQueue::new(),
            processing_queue: WorkQueue::new(),
            semaphore,
            counters: PipelineCounters::default(),
            failures: Mutex::new(Vec::new()),
            skipped: Mutex::new(Vec::new()),
            cancel,
            progress,
        }
    }

    pub fn record_failure(&self, path: &str, stage: FailureStage, reason: impl ToString) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(Failure {
                path: path.to_string(),
                stage,
                reason: reason.to_string(),
            });
        }
    }

    pub fn record_skip(&self, skipped: Skipped) {
        if let Ok(mut list) = self.skipped.lock() {
            list.push(skipped);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Local destination for a node: `download_dir/<absolute_name>`.
    pub fn local_path(&self, node: &TreeNode) -> PathBuf {
        self.tuning.download_dir.join(node.absolute_name())
    }
}
