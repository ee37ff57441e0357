pub mod config;
pub mod fd_limit;
pub mod harvest_toml;
pub mod logger;

pub use config::*;
pub use fd_limit::{FDS_PER_FETCH, cap_concurrency, max_fetches_by_fd_limit, max_open_fds};
pub use logger::setup_logging;
