//! Public and internal types for the textharvest API and pipeline.

use std::fmt;
use std::path::PathBuf;

use crate::utils::config::PipelineDefaults;

/// Whether a tree node is a directory or a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Directory,
    File,
}

/// One entry of a parsed listing. Dirs own their children; files never have any.
///
/// `relative_name` is always the last `/`-segment of `absolute_name`; both are fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    absolute_name: String,
    relative_name: String,
    kind: NodeKind,
    handle: Option<String>,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(absolute_name: impl Into<String>, kind: NodeKind, handle: Option<String>) -> Self {
        let absolute_name = absolute_name.into();
        let relative_name = last_segment(&absolute_name).to_string();
        Self {
            absolute_name,
            relative_name,
            kind,
            handle,
            children: Vec::new(),
        }
    }

    /// Build a child whose absolute name is `self.absolute_name + "/" + name`.
    pub fn child(&self, name: &str, kind: NodeKind, handle: Option<String>) -> Self {
        Self::new(join_name(&self.absolute_name, name), kind, handle)
    }

    pub fn absolute_name(&self) -> &str {
        &self.absolute_name
    }

    pub fn relative_name(&self) -> &str {
        &self.relative_name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Append as last child. Files cannot take children; the parser never asks them to.
    pub(crate) fn push_child(&mut self, child: TreeNode) {
        debug_assert!(self.is_dir(), "file node {} given a child", self.absolute_name);
        self.children.push(child);
    }

    /// Leaf copy (no children). Used to hand a file to the pipeline without cloning a subtree.
    pub fn detached(&self) -> Self {
        Self {
            absolute_name: self.absolute_name.clone(),
            relative_name: self.relative_name.clone(),
            kind: self.kind,
            handle: self.handle.clone(),
            children: Vec::new(),
        }
    }

    /// `absolute_name` without its first segment (the tree root). Remote storage knows paths without our root label.
    pub fn path_without_root(&self) -> &str {
        match self.absolute_name.split_once('/') {
            Some((_, rest)) => rest,
            None => "",
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.absolute_name, self.kind)
    }
}

/// Join a parent absolute name and a segment with `/`.
pub fn join_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Element of the processing queue: a downloaded file, or the end-of-stream marker.
#[derive(Clone, Debug)]
pub enum WorkItem {
    File(TreeNode),
    EndOfStream,
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::File(node) => write!(f, "{}", node.absolute_name()),
            WorkItem::EndOfStream => f.write_str("@@Processing$Done@@"),
        }
    }
}

/// Text extracted from one file. Owned by the sender once handed over.
#[derive(Clone, Debug)]
pub struct ExtractedDocument {
    pub source: TreeNode,
    pub text: String,
}

/// Per-item lifecycle inside the extraction stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    Received,
    Dispatched,
    Completed,
    Failed,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemState::Received => "received",
            ItemState::Dispatched => "dispatched",
            ItemState::Completed => "completed",
            ItemState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Where in the pipeline a file was lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureStage {
    Fetch,
    Extract,
    Send,
    Cancelled,
    Worker,
}

#[derive(Clone, Debug)]
pub struct Failure {
    pub path: String,
    pub stage: FailureStage,
    pub reason: String,
}

/// Why a downloaded file was not dispatched for extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Oversize,
    Unsupported,
}

#[derive(Clone, Debug)]
pub struct Skipped {
    pub path: String,
    pub reason: SkipReason,
}

/// Outcome of one pipeline run. Every seeded file ends up sent, skipped, or failed.
#[derive(Clone, Debug, Default)]
pub struct HarvestReport {
    pub seeded: usize,
    pub fetched: usize,
    pub extracted: usize,
    pub sent: usize,
    pub skipped: Vec<Skipped>,
    pub failures: Vec<Failure>,
}

impl HarvestReport {
    /// Files with a known fate. Equals `seeded` after a completed run.
    pub fn accounted(&self) -> usize {
        self.sent + self.skipped.len() + self.failures.len()
    }

    pub fn failures_in(&self, stage: FailureStage) -> usize {
        self.failures.iter().filter(|f| f.stage == stage).count()
    }
}

/// Listing parse options.
#[derive(Clone, Debug)]
pub struct ParseSettings {
    /// Dot-prefixed suffixes that make an extension-bearing line a file (e.g. `.pdf`).
    pub extension_whitelist: Vec<String>,
    /// Keep only nodes whose absolute name contains one of these. Empty = keep everything.
    pub allowed_path_fragments: Vec<String>,
    /// Files take their parent directory's handle instead of their own.
    pub file_handle_inherits_parent: bool,
}

impl ParseSettings {
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extension_whitelist: extensions.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_allowed_paths(mut self, fragments: &[&str]) -> Self {
        self.allowed_path_fragments = fragments.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            extension_whitelist: PipelineDefaults::EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_path_fragments: Vec::new(),
            file_handle_inherits_parent: true,
        }
    }
}

/// Pipeline tuning for [`Coordinator`](crate::pipeline::Coordinator).
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Local directory downloads land in (joined with each node's absolute name).
    pub download_dir: PathBuf,
    /// Permits in the global semaphore shared by downloads and extractions.
    pub max_concurrency: usize,
    /// Threads in the extraction pool; also the cap on outstanding extractions.
    pub pool_size: usize,
    /// Files above this many MiB are skipped before extraction.
    pub max_file_mib: u64,
    /// Show a progress bar for downloads.
    pub verbose: bool,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            max_concurrency: PipelineDefaults::MAX_CONCURRENCY,
            pool_size: PipelineDefaults::POOL_SIZE,
            max_file_mib: PipelineDefaults::MAX_FILE_MIB,
            verbose: false,
        }
    }
}

/// Full options (CLI). Lib callers use [`ParseSettings`] and [`PipelineOpts`] directly.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Label of the tree root; prepended to every absolute name.
    pub root_name: String,
    pub parse: ParseSettings,
    pub pipeline: PipelineOpts,
    /// Download command (program followed by fixed args); remote and local paths are appended.
    pub fetch_command: Vec<String>,
    /// Command whose stdout is the listing, used when no listing file is given.
    pub listing_command: Vec<String>,
    /// JSON-lines output for extracted text. None = log-only sender.
    pub output: Option<PathBuf>,
    /// Fail the run (after it completes) if any file was lost.
    pub strict: bool,
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            root_name: PipelineDefaults::ROOT_NAME.to_string(),
            parse: ParseSettings::default(),
            pipeline: PipelineOpts::default(),
            fetch_command: PipelineDefaults::FETCH_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            listing_command: PipelineDefaults::LISTING_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output: None,
            strict: false,
            verbose: false,
        }
    }
}
