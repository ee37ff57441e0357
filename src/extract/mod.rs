//! Extension-based dispatch to text extraction handlers.

pub mod backends;
pub mod handlers;
pub mod normalize;

pub use backends::{
    CommandDocReader, DocReader, OcrEngine, PageTextSource, PdfToText, TesseractOcr, run_tool,
};
pub use handlers::{Extractor, ExtractorKit, Handler};
pub use normalize::normalize_text;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Result of looking a file up in the [`DispatchTable`].
#[derive(Clone, Debug)]
pub enum Dispatch {
    Handler(Handler),
    /// No handler for this extension (or no extension at all).
    Unsupported(String),
}

/// Extensions treated as plain text.
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &[
    ".txt", ".c", ".cpp", ".h", ".hpp", ".java", ".py", ".racket",
];

/// Map from lower-case dot-prefixed extension to handler.
#[derive(Clone, Debug)]
pub struct DispatchTable {
    handlers: HashMap<String, Handler>,
}

impl Default for DispatchTable {
    /// Built-in table. `.docx` goes through the paged handler alongside `.pdf`.
    fn default() -> Self {
        let mut table = Self::empty();
        for ext in PLAIN_TEXT_EXTENSIONS {
            table.insert(ext, Handler::PlainText);
        }
        table.insert(".pdf", Handler::PagedDocument);
        table.insert(".docx", Handler::PagedDocument);
        table.insert(".doc", Handler::LegacyDocument);
        table
    }
}

impl DispatchTable {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn insert(&mut self, ext: &str, handler: Handler) {
        self.handlers.insert(normalize_extension(ext), handler);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, ext: &str, handler: Handler) -> Self {
        self.insert(ext, handler);
        self
    }

    /// Route every extension to one custom extractor.
    pub fn with_extractor(mut self, exts: &[&str], extractor: Arc<dyn Extractor>) -> Self {
        for ext in exts {
            self.insert(ext, Handler::Custom(Arc::clone(&extractor)));
        }
        self
    }

    pub fn resolve(&self, path: &Path) -> Dispatch {
        let ext = path
            .extension()
            .map(|e| normalize_extension(&e.to_string_lossy()))
            .unwrap_or_default();
        match self.handlers.get(&ext) {
            Some(handler) => Dispatch::Handler(handler.clone()),
            None => Dispatch::Unsupported(ext),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// `"PDF"`, `".PDF"` and `".pdf"` all become `".pdf"`.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}
