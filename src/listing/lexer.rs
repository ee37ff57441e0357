//! Line tokenizer for tab-indented listings.
//!
//! Each non-blank line becomes one [`ListingToken`]: depth from leading tabs, name and optional
//! trailing `<H:handle>` marker, and a kind decided by the extension whitelist.

use std::str::Lines;

use crate::ParseSettings;
use crate::utils::config::HandleMarker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Directory,
    File,
    /// File-like line whose extension is not whitelisted.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingToken {
    pub kind: TokenKind,
    pub name: String,
    pub depth: usize,
    pub handle: Option<String>,
}

/// Lazy, single-pass token stream over a listing. Build a new lexer to iterate again.
pub struct ListingLexer<'a> {
    lines: Lines<'a>,
    settings: &'a ParseSettings,
}

impl<'a> ListingLexer<'a> {
    pub fn new(text: &'a str, settings: &'a ParseSettings) -> Self {
        Self {
            lines: text.lines(),
            settings,
        }
    }

    fn tokenize(&self, line: &str) -> Option<ListingToken> {
        let depth = line.chars().take_while(|&c| c == '\t').count();
        let (name, handle) = split_handle(line.trim());
        if name.is_empty() {
            return None;
        }
        let kind = match extension_of(name) {
            None => TokenKind::Directory,
            Some(ext) if self.is_whitelisted(name, ext) => TokenKind::File,
            Some(_) => TokenKind::Skip,
        };
        Some(ListingToken {
            kind,
            name: name.to_string(),
            depth,
            handle: handle.map(str::to_string),
        })
    }

    fn is_whitelisted(&self, name: &str, ext: &str) -> bool {
        self.settings
            .extension_whitelist
            .iter()
            .any(|postfix| ext.eq_ignore_ascii_case(postfix) || name.contains(postfix.as_str()))
    }
}

impl Iterator for ListingLexer<'_> {
    type Item = ListingToken;

    fn next(&mut self) -> Option<ListingToken> {
        loop {
            let line = self.lines.next()?;
            if let Some(token) = self.tokenize(line) {
                return Some(token);
            }
        }
    }
}

/// Split `name<H:id>` into `("name", Some("id"))`. Lines without a well-formed marker keep their full text as name.
pub fn split_handle(line: &str) -> (&str, Option<&str>) {
    if !line.ends_with(HandleMarker::CLOSE) {
        return (line, None);
    }
    match line.rfind(HandleMarker::OPEN) {
        Some(start) => {
            let handle = &line[start + HandleMarker::OPEN.len()..line.len() - 1];
            (line[..start].trim_end(), Some(handle))
        }
        None => (line, None),
    }
}

/// Extension including the dot (`"notes.pdf"` -> `".pdf"`). Leading dots do not count (`".bashrc"` has none).
pub fn extension_of(name: &str) -> Option<&str> {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    name[stem_start..]
        .rfind('.')
        .map(|idx| &name[stem_start + idx..])
}
