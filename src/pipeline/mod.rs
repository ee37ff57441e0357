//! Pipeline components: queues, context, download and extraction stages, coordinator.

pub mod context;
pub mod download;
pub mod error_handler;
pub mod extraction;
pub mod orchestrator;
pub mod queue;

pub use context::{Capabilities, PipelineContext, PipelineCounters, PipelineTuning};
pub use download::spawn_download_workers;
pub use error_handler::summarize_report;
pub use extraction::ExtractionStage;
pub use orchestrator::Coordinator;
pub use queue::{DoneGuard, WorkQueue};
