//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Optional settings file looked up in the working directory.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Pipeline ----

/// Defaults for listing parse and pipeline tuning.
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Global semaphore permits (downloads + in-flight extractions).
    pub const MAX_CONCURRENCY: usize = 1024;
    /// Extraction pool threads.
    pub const POOL_SIZE: usize = 5;
    /// Files above this are not extracted (MiB).
    pub const MAX_FILE_MIB: u64 = 100;
    /// Label for the tree root.
    pub const ROOT_NAME: &'static str = "CS";
    /// Extensions kept by default.
    pub const EXTENSIONS: &'static [&'static str] = &[".txt", ".pdf", ".doc"];
    /// `<program> [args..] <remote> <local>`
    pub const FETCH_COMMAND: &'static [&'static str] = &["mega-get"];
    /// Recursive listing command.
    pub const LISTING_COMMAND: &'static [&'static str] = &["mega-ls", "-r"];
}

/// Mebibytes to bytes (`n * 2^20`), saturating at `u64::MAX`.
pub const fn as_mib(n: u64) -> u64 {
    n.saturating_mul(1 << 20)
}

// ---- Listing format ----

/// Handle marker wrapped around the opaque id at the end of a listing line: `name<H:id>`.
pub struct HandleMarker;

impl HandleMarker {
    pub const OPEN: &'static str = "<H:";
    pub const CLOSE: char = '>';
}

// ---- Extraction backends ----

/// External tools used by the default extraction backends.
pub struct ToolDefaults;

impl ToolDefaults {
    pub const PDFTOTEXT: &'static str = "pdftotext";
    pub const PDFTOPPM: &'static str = "pdftoppm";
    pub const TESSERACT: &'static str = "tesseract";
    pub const ANTIWORD: &'static str = "antiword";
    /// Tesseract languages for OCR fallback.
    pub const OCR_LANGS: &'static str = "heb+eng";
    /// Raster resolution for OCR pages.
    pub const OCR_DPI: u32 = 300;
}

// ---- Progress ----

/// Progress bar tuning.
pub struct ProgressConsts;

impl ProgressConsts {
    /// Label shown on the download bar.
    pub const DOWNLOAD_DESC: &'static str = "Downloading";
}
