//! Engine module: CLI surface and the external capabilities (fetch, send, progress)

pub mod arg_parser;
pub mod cli;
pub mod fetch;
pub mod progress;
pub mod sender;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use fetch::{CommandFetcher, Fetcher, run_command};
pub use sender::{DocumentSender, JsonLinesSender, LogSender};
