//! Listing components: tokenizer, stack parser, parsed tree.

pub mod lexer;
pub mod parser;
pub mod tree;

pub use lexer::{ListingLexer, ListingToken, TokenKind, extension_of, split_handle};
pub use parser::ListingParser;
pub use tree::{Dfs, DirTree};

use crate::ParseSettings;

/// Parse `text` into a tree rooted at `root_name`.
pub fn parse_listing(root_name: &str, text: &str, settings: &ParseSettings) -> DirTree {
    let tree = ListingParser::new(root_name, text, settings).parse();
    log::debug!(
        "Parsed listing: {} nodes, {} files",
        tree.len(),
        tree.files().count()
    );
    tree
}
