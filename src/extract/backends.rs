//! Pluggable readers behind the extraction handlers, with defaults that drive external tools.
//!
//! All of these run on extraction pool threads, so they block freely.

use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::utils::config::ToolDefaults;

/// Per-page text of a paged document. Pages are returned in order; page `i` is `pages[i]` (0-based).
pub trait PageTextSource: Send + Sync {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>>;
}

/// Recognise text on the given 1-based pages. Output is aligned with `pages`.
pub trait OcrEngine: Send + Sync {
    fn recognize_pages(&self, path: &Path, pages: &[usize]) -> Result<Vec<String>>;
}

/// Plain-text accessor for legacy word-processor documents.
pub trait DocReader: Send + Sync {
    fn plain_text(&self, path: &Path) -> Result<String>;
}

/// Run a tool to completion and return its stdout. Non-zero exit is an error carrying stderr.
pub fn run_tool<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("spawn {program}"))?;
    if !output.status.success() {
        bail!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `pdftotext <file> -`: pages are separated by form feeds.
#[derive(Clone, Debug)]
pub struct PdfToText {
    pub program: String,
}

impl Default for PdfToText {
    fn default() -> Self {
        Self {
            program: ToolDefaults::PDFTOTEXT.to_string(),
        }
    }
}

impl PageTextSource for PdfToText {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>> {
        let out = run_tool(&self.program, [path.as_os_str(), OsStr::new("-")])?;
        Ok(split_pages(&out))
    }
}

/// Split form-feed separated output into pages. The trailing form feed does not open a page.
pub fn split_pages(out: &str) -> Vec<String> {
    let mut pages: Vec<String> = out.split('\x0c').map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) && pages.len() > 1 {
        pages.pop();
    }
    pages
}

/// Rasterise each page with `pdftoppm`, then read it with `tesseract`.
#[derive(Clone, Debug)]
pub struct TesseractOcr {
    pub rasterizer: String,
    pub program: String,
    pub langs: String,
    pub dpi: u32,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            rasterizer: ToolDefaults::PDFTOPPM.to_string(),
            program: ToolDefaults::TESSERACT.to_string(),
            langs: ToolDefaults::OCR_LANGS.to_string(),
            dpi: ToolDefaults::OCR_DPI,
        }
    }
}

impl TesseractOcr {
    fn recognize_page(&self, path: &Path, page: usize, scratch: &Path) -> Result<String> {
        let prefix = scratch.join(format!("page-{page}"));
        let page_arg = page.to_string();
        let dpi_arg = self.dpi.to_string();
        run_tool(
            &self.rasterizer,
            [
                OsStr::new("-f"),
                OsStr::new(&page_arg),
                OsStr::new("-l"),
                OsStr::new(&page_arg),
                OsStr::new("-r"),
                OsStr::new(&dpi_arg),
                OsStr::new("-png"),
                OsStr::new("-singlefile"),
                path.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;
        let image = prefix.with_extension("png");
        run_tool(
            &self.program,
            [
                image.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(&self.langs),
                OsStr::new("--oem"),
                OsStr::new("3"),
                OsStr::new("--psm"),
                OsStr::new("6"),
            ],
        )
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize_pages(&self, path: &Path, pages: &[usize]) -> Result<Vec<String>> {
        let scratch = tempfile::tempdir().context("create OCR scratch dir")?;
        pages
            .iter()
            .map(|&page| {
                self.recognize_page(path, page, scratch.path())
                    .with_context(|| format!("OCR page {} of {}", page, path.display()))
            })
            .collect()
    }
}

/// Legacy `.doc` text via `antiword <file>` (or any tool printing text to stdout).
#[derive(Clone, Debug)]
pub struct CommandDocReader {
    pub program: String,
}

impl Default for CommandDocReader {
    fn default() -> Self {
        Self {
            program: ToolDefaults::ANTIWORD.to_string(),
        }
    }
}

impl DocReader for CommandDocReader {
    fn plain_text(&self, path: &Path) -> Result<String> {
        run_tool(&self.program, [path.as_os_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pages_drops_trailing_feed() {
        assert_eq!(split_pages("one\x0ctwo\x0c"), vec!["one", "two"]);
        assert_eq!(split_pages("one\x0c\x0cthree"), vec!["one", "", "three"]);
        assert_eq!(split_pages(""), vec![""]);
    }

    #[test]
    fn missing_tool_is_an_error() {
        let err = run_tool("textharvest-no-such-tool", ["x"]).unwrap_err();
        assert!(err.to_string().contains("spawn"));
    }
}
