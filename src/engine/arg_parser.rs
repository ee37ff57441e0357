use clap::Parser;
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const STDIN: &'static str = "-";
    pub const RESULTS: &'static str = "textharvest.jsonl";
}

/// Download a filtered remote file tree and extract normalized text from it.
#[derive(Clone, Parser)]
#[command(name = "textharvest")]
#[command(about = "Parse a tab-indented remote listing, download the selected files and extract their text.")]
pub struct Cli {
    /// Listing file (`-` for stdin). Default: run the listing command.
    #[arg(value_name = "LISTING")]
    pub listing: Option<PathBuf>,

    /// Label for the tree root; remote paths are absolute names without it.
    #[arg(long, short = 'r')]
    pub root: Option<String>,

    /// Whitelisted file extensions (dot-prefixed). Can specify multiple: -e .pdf .txt
    #[arg(long = "ext", short = 'e', num_args = 1..)]
    pub extensions: Vec<String>,

    /// Keep only paths containing one of these fragments. Can specify multiple.
    #[arg(long = "allow", short = 'a', num_args = 1..)]
    pub allowed_paths: Vec<String>,

    /// Give files their own handle instead of their parent directory's.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub own_handles: Option<bool>,

    /// Where downloaded files land. Default: current directory.
    #[arg(long, short = 'd')]
    pub download_dir: Option<PathBuf>,

    /// Write extracted text as JSON lines. Without a value: `textharvest.jsonl`.
    #[arg(long, short = 'o', num_args = 0..=1, default_missing_value = DefaultArgs::RESULTS)]
    pub output: Option<PathBuf>,

    /// Download command; remote path and local destination are appended. Default: `mega-get`.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub fetch_cmd: Vec<String>,

    /// Command printing the listing to stdout. Default: `mega-ls -r`.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub listing_cmd: Vec<String>,

    /// Max concurrent downloads + extractions.
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Extraction worker threads.
    #[arg(long, short = 'p')]
    pub pool_size: Option<usize>,

    /// Skip files larger than this many MiB.
    #[arg(long)]
    pub max_file_mib: Option<u64>,

    /// Print the parsed tree.
    #[arg(long, short = 't')]
    pub print_tree: bool,

    /// Parse and list the files that would be downloaded; do not download anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Strict mode: exit with an error if any file was lost (after the run completes).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

impl Cli {
    /// True when the listing comes from stdin.
    pub fn listing_from_stdin(&self) -> bool {
        self.listing
            .as_deref()
            .is_some_and(|p| p.as_os_str() == DefaultArgs::STDIN)
    }
}
