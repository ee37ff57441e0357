//! Per-type extraction handlers. Each is a function of a file path to its text.

use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::backends::{
    CommandDocReader, DocReader, OcrEngine, PageTextSource, PdfToText, TesseractOcr,
};
use super::normalize::normalize_text;

/// Caller-supplied extraction for one file type.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String>;
}

impl<F> Extractor for F
where
    F: Fn(&Path) -> Result<String> + Send + Sync,
{
    fn extract(&self, path: &Path) -> Result<String> {
        self(path)
    }
}

/// Readers the built-in handlers delegate to.
#[derive(Clone)]
pub struct ExtractorKit {
    pub pages: Arc<dyn PageTextSource>,
    pub ocr: Arc<dyn OcrEngine>,
    pub doc: Arc<dyn DocReader>,
}

impl Default for ExtractorKit {
    fn default() -> Self {
        Self {
            pages: Arc::new(PdfToText::default()),
            ocr: Arc::new(TesseractOcr::default()),
            doc: Arc::new(CommandDocReader::default()),
        }
    }
}

#[derive(Clone)]
pub enum Handler {
    /// Whole file as text, untouched.
    PlainText,
    /// Per-page text with OCR fallback for empty pages, normalized.
    PagedDocument,
    /// Legacy word-processor document via [`DocReader`]; not normalized.
    LegacyDocument,
    Custom(Arc<dyn Extractor>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::PlainText => f.write_str("PlainText"),
            Handler::PagedDocument => f.write_str("PagedDocument"),
            Handler::LegacyDocument => f.write_str("LegacyDocument"),
            Handler::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl Handler {
    pub fn run(&self, kit: &ExtractorKit, path: &Path) -> Result<String> {
        match self {
            Handler::PlainText => read_plain_text(path),
            Handler::PagedDocument => extract_paged(kit, path),
            Handler::LegacyDocument => kit.doc.plain_text(path),
            Handler::Custom(extractor) => extractor.extract(path),
        }
    }
}

fn read_plain_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Normalize each page; pages left empty go to OCR in one call, only if there are any.
fn extract_paged(kit: &ExtractorKit, path: &Path) -> Result<String> {
    let mut pages: Vec<String> = kit
        .pages
        .page_texts(path)?
        .iter()
        .map(|p| normalize_text(p))
        .collect();
    let deferred: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, text)| text.is_empty())
        .map(|(i, _)| i + 1)
        .collect();

    if !deferred.is_empty() {
        debug!(
            "{}: {} of {} pages need OCR",
            path.display(),
            deferred.len(),
            pages.len()
        );
        let recognized = kit.ocr.recognize_pages(path, &deferred)?;
        for (page, text) in deferred.iter().zip(recognized) {
            pages[page - 1] = normalize_text(&text);
        }
    }

    Ok(pages
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}
