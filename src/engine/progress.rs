//! Progress bar utilities for displaying download status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " files"
    )))
}

/// Bar over `total` files when `verbose`, nothing otherwise.
pub fn download_bar(verbose: bool, total: usize, desc: &'static str) -> Option<ProgressBar> {
    verbose.then(|| create_progress_bar(ProgressBarConfig::new(total, desc, Animation::Classic)))
}

/// Update progress bar if available
/// Uses try_lock so download workers never wait on the bar
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Force the bar to its final position (e.g. after workers skipped updates under contention).
pub fn finish_bar(pb: &ProgressBar, done: usize) {
    if let Ok(mut bar) = pb.lock() {
        bar.counter = done;
        let _ = bar.refresh();
    }
}
