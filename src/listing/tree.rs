//! Parsed listing hierarchy and its depth-first traversal.

use crate::{NodeKind, TreeNode};

/// Single-rooted tree produced by [`ListingParser`](super::ListingParser). Read-only after parse.
#[derive(Clone, Debug)]
pub struct DirTree {
    root: TreeNode,
}

impl DirTree {
    pub(crate) fn from_root(root: TreeNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Pre-order traversal in listing order, root first. Each call starts from a fresh stack.
    pub fn iter(&self) -> Dfs<'_> {
        Dfs {
            stack: vec![&self.root],
        }
    }

    /// File leaves in traversal order.
    pub fn files(&self) -> impl Iterator<Item = &TreeNode> {
        self.iter().filter(|n| n.kind() == NodeKind::File)
    }

    /// Directories in traversal order, root included.
    pub fn directories(&self) -> impl Iterator<Item = &TreeNode> {
        self.iter().filter(|n| n.kind() == NodeKind::Directory)
    }

    /// Detached copies of every file leaf, ready to seed the pipeline.
    pub fn file_list(&self) -> Vec<TreeNode> {
        self.files().map(TreeNode::detached).collect()
    }

    /// Total node count including the root.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Only the root is present.
    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }

    pub fn find(&self, absolute_name: &str) -> Option<&TreeNode> {
        self.iter().find(|n| n.absolute_name() == absolute_name)
    }

    /// Indented `- name` rendering, two spaces per level.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        render(&self.root, 0, &mut out);
        out
    }
}

fn render(node: &TreeNode, level: usize, out: &mut String) {
    out.push_str(&"  ".repeat(level));
    out.push_str("- ");
    out.push_str(node.relative_name());
    out.push('\n');
    for child in node.children() {
        render(child, level + 1, out);
    }
}

impl<'a> IntoIterator for &'a DirTree {
    type Item = &'a TreeNode;
    type IntoIter = Dfs<'a>;

    fn into_iter(self) -> Dfs<'a> {
        self.iter()
    }
}

/// Depth-first iterator over a [`DirTree`].
pub struct Dfs<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Dfs<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<&'a TreeNode> {
        let current = self.stack.pop()?;
        // reversed so the first child is visited first
        self.stack.extend(current.children().iter().rev());
        Some(current)
    }
}
