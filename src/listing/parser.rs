//! Rebuild the directory hierarchy from lexer tokens with an indent-depth stack.

use log::{debug, warn};
use std::collections::HashMap;

use super::lexer::{ListingLexer, ListingToken, TokenKind};
use super::tree::DirTree;
use crate::{NodeKind, ParseSettings, TreeNode, join_name};

/// Arena slot used while parsing; frozen into [`TreeNode`]s at the end.
struct Slot {
    absolute_name: String,
    kind: NodeKind,
    handle: Option<String>,
    children: Vec<usize>,
    /// Own name contains an allowed fragment (always true without fragments).
    matches: bool,
}

/// What a stack entry stands for: a real directory, or an elided entry whose subtree is dropped.
#[derive(Clone, Copy)]
enum Scope {
    Node(usize),
    Elided,
}

const ROOT: usize = 0;
const ROOT_DEPTH: isize = -1;

/// One-pass parser over a listing. Consumes itself; parse again by building a new parser.
pub struct ListingParser<'a> {
    root_name: String,
    lexer: ListingLexer<'a>,
    settings: &'a ParseSettings,
}

impl<'a> ListingParser<'a> {
    pub fn new(root_name: &str, text: &'a str, settings: &'a ParseSettings) -> Self {
        Self {
            root_name: root_name.to_string(),
            lexer: ListingLexer::new(text, settings),
            settings,
        }
    }

    pub fn parse(self) -> DirTree {
        let Self {
            root_name,
            lexer,
            settings,
        } = self;
        let mut builder = Builder {
            arena: vec![Slot {
                absolute_name: root_name,
                kind: NodeKind::Directory,
                handle: None,
                children: Vec::new(),
                matches: true,
            }],
            stack: vec![(Scope::Node(ROOT), ROOT_DEPTH)],
            by_name: HashMap::new(),
            settings,
        };

        for token in lexer {
            builder.place(token);
        }

        let Builder { arena, .. } = builder;
        let prune = !settings.allowed_path_fragments.is_empty();
        let root = freeze(&arena, ROOT, prune).unwrap_or_else(|| {
            TreeNode::new(arena[ROOT].absolute_name.clone(), NodeKind::Directory, None)
        });
        DirTree::from_root(root)
    }
}

/// Parse state: node arena, depth stack, and an absolute-name index keeping names unique.
struct Builder<'a> {
    arena: Vec<Slot>,
    stack: Vec<(Scope, isize)>,
    by_name: HashMap<String, usize>,
    settings: &'a ParseSettings,
}

impl Builder<'_> {
    /// Attach one token under the nearest shallower scope.
    ///
    /// Skip tokens also take part in the stack: they pop to their depth and open an elided
    /// scope, so lines indented below a skipped entry are dropped with it rather than
    /// attaching to the previous directory.
    ///
    /// A repeated absolute name keeps the first node: a repeated directory reopens it, a
    /// repeated file is dropped.
    fn place(&mut self, token: ListingToken) {
        let depth = token.depth as isize;
        while self.stack.last().is_some_and(|&(_, d)| d >= depth) {
            self.stack.pop();
        }

        let top = self.stack.last().map(|&(scope, _)| scope);
        let parent = match (token.kind, top) {
            (TokenKind::Skip, _) | (_, Some(Scope::Elided)) => {
                if token.kind != TokenKind::File {
                    self.stack.push((Scope::Elided, depth));
                }
                return;
            }
            (_, Some(Scope::Node(id))) => id,
            // root is never popped: its depth is below any token's
            (_, None) => ROOT,
        };

        let absolute_name = join_name(&self.arena[parent].absolute_name, &token.name);
        let kind = match token.kind {
            TokenKind::File => NodeKind::File,
            _ => NodeKind::Directory,
        };

        if let Some(&existing) = self.by_name.get(&absolute_name) {
            warn!("Duplicate entry {} (keeping the first)", absolute_name);
            if kind == NodeKind::Directory && self.arena[existing].kind == NodeKind::Directory {
                self.stack.push((Scope::Node(existing), depth));
            } else if kind == NodeKind::Directory {
                self.stack.push((Scope::Elided, depth));
            }
            return;
        }

        let matches = self.matches_fragment(&absolute_name);
        if kind == NodeKind::File && !matches {
            debug!("Skipping {}", absolute_name);
            return;
        }
        let handle = if kind == NodeKind::File && self.settings.file_handle_inherits_parent {
            self.arena[parent].handle.clone()
        } else {
            token.handle
        };

        let id = self.arena.len();
        self.by_name.insert(absolute_name.clone(), id);
        self.arena.push(Slot {
            absolute_name,
            kind,
            handle,
            children: Vec::new(),
            matches,
        });
        self.arena[parent].children.push(id);
        if kind == NodeKind::Directory {
            self.stack.push((Scope::Node(id), depth));
        }
    }

    /// Fragments are matched below the root label, so the label itself never matches.
    fn matches_fragment(&self, absolute_name: &str) -> bool {
        let fragments = &self.settings.allowed_path_fragments;
        if fragments.is_empty() {
            return true;
        }
        let below_root = absolute_name
            .strip_prefix(self.arena[ROOT].absolute_name.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(absolute_name);
        fragments.iter().any(|f| below_root.contains(f.as_str()))
    }
}

/// Build owned nodes from the arena. With `prune`, directories that neither match a fragment nor keep any descendant are dropped.
fn freeze(arena: &[Slot], id: usize, prune: bool) -> Option<TreeNode> {
    let slot = &arena[id];
    let mut node = TreeNode::new(slot.absolute_name.clone(), slot.kind, slot.handle.clone());
    for &child in &slot.children {
        if let Some(child) = freeze(arena, child, prune) {
            node.push_child(child);
        }
    }
    let keep = id == ROOT
        || slot.kind == NodeKind::File
        || !prune
        || slot.matches
        || !node.children().is_empty();
    if !keep {
        debug!("Pruning {} (no allowed descendants)", slot.absolute_name);
    }
    keep.then_some(node)
}
