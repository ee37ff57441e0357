//! Dispatch table lookups and the built-in handlers with fake backends.

use anyhow::{Result, bail};
use std::path::Path;
use std::sync::{Arc, Mutex};

use textharvest::extract::{
    Dispatch, DispatchTable, DocReader, ExtractorKit, Handler, OcrEngine, PageTextSource,
    normalize_text,
};

struct FixedPages(Vec<&'static str>);

impl PageTextSource for FixedPages {
    fn page_texts(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|p| p.to_string()).collect())
    }
}

/// Returns `"ocr <page>"` for every page and remembers what it was asked for.
#[derive(Default)]
struct RecordingOcr {
    asked: Mutex<Vec<Vec<usize>>>,
}

impl OcrEngine for RecordingOcr {
    fn recognize_pages(&self, _path: &Path, pages: &[usize]) -> Result<Vec<String>> {
        self.asked.lock().unwrap().push(pages.to_vec());
        Ok(pages.iter().map(|p| format!("ocr\t{p}")).collect())
    }
}

struct RawDoc;

impl DocReader for RawDoc {
    fn plain_text(&self, _path: &Path) -> Result<String> {
        Ok("  keep\tas is | \n".to_string())
    }
}

struct BrokenPages;

impl PageTextSource for BrokenPages {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>> {
        bail!("cannot open {}", path.display())
    }
}

fn kit(pages: Arc<dyn PageTextSource>, ocr: Arc<RecordingOcr>) -> ExtractorKit {
    ExtractorKit {
        pages,
        ocr,
        doc: Arc::new(RawDoc),
    }
}

#[test]
fn paged_handler_ocrs_only_empty_pages() {
    let ocr = Arc::new(RecordingOcr::default());
    let kit = kit(
        Arc::new(FixedPages(vec!["Hello\n  world |", "\u{200B} ", "Last\tpage"])),
        Arc::clone(&ocr),
    );

    let text = Handler::PagedDocument.run(&kit, Path::new("doc.pdf")).unwrap();

    assert_eq!(text, "Hello world\nocr 2\nLast page");
    assert_eq!(*ocr.asked.lock().unwrap(), vec![vec![2]]);
}

#[test]
fn paged_handler_skips_ocr_when_every_page_has_text() {
    let ocr = Arc::new(RecordingOcr::default());
    let kit = kit(Arc::new(FixedPages(vec!["one", "two"])), Arc::clone(&ocr));

    let text = Handler::PagedDocument.run(&kit, Path::new("doc.pdf")).unwrap();

    assert_eq!(text, "one\ntwo");
    assert!(ocr.asked.lock().unwrap().is_empty());
}

#[test]
fn paged_handler_propagates_reader_errors() {
    let kit = kit(Arc::new(BrokenPages), Arc::new(RecordingOcr::default()));
    let err = Handler::PagedDocument
        .run(&kit, Path::new("broken.pdf"))
        .unwrap_err();
    assert!(err.to_string().contains("broken.pdf"));
}

#[test]
fn legacy_document_text_is_not_normalized() {
    let kit = kit(Arc::new(FixedPages(vec![])), Arc::new(RecordingOcr::default()));
    let text = Handler::LegacyDocument.run(&kit, Path::new("old.doc")).unwrap();
    assert_eq!(text, "  keep\tas is | \n");
}

#[test]
fn plain_text_reads_file_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "line one\n\tline two\n").unwrap();

    let text = Handler::PlainText
        .run(&ExtractorKit::default(), &path)
        .unwrap();
    assert_eq!(text, "line one\n\tline two\n");
}

#[test]
fn default_table_routes_by_extension() {
    let table = DispatchTable::default();
    assert!(matches!(
        table.resolve(Path::new("a/b/Scan.PDF")),
        Dispatch::Handler(Handler::PagedDocument)
    ));
    assert!(matches!(
        table.resolve(Path::new("report.docx")),
        Dispatch::Handler(Handler::PagedDocument)
    ));
    assert!(matches!(
        table.resolve(Path::new("old.doc")),
        Dispatch::Handler(Handler::LegacyDocument)
    ));
    assert!(matches!(
        table.resolve(Path::new("main.cpp")),
        Dispatch::Handler(Handler::PlainText)
    ));
    match table.resolve(Path::new("photo.png")) {
        Dispatch::Unsupported(ext) => assert_eq!(ext, ".png"),
        other => panic!("expected unsupported, got {other:?}"),
    }
    assert!(matches!(
        table.resolve(Path::new("Makefile")),
        Dispatch::Unsupported(_)
    ));
}

#[test]
fn custom_extractor_overrides_builtin() {
    let table = DispatchTable::default().with_extractor(
        &["PDF"],
        Arc::new(|_: &Path| -> Result<String> { Ok("custom".to_string()) }),
    );
    let Dispatch::Handler(handler) = table.resolve(Path::new("x.pdf")) else {
        panic!("pdf should resolve");
    };
    assert_eq!(handler.run(&ExtractorKit::default(), Path::new("x.pdf")).unwrap(), "custom");
}

#[test]
fn normalization_is_idempotent_on_messy_input() {
    let messy = "  Cafe\u{0301} |\tmenu\r\n\u{FEFF}prices\u{0007}  \u{00A0}here ";
    let once = normalize_text(messy);
    assert_eq!(once, "Café menu prices here");
    assert_eq!(normalize_text(&once), once);
}
