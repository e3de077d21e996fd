//! File-tree explorer state.
//!
//! The explorer only reflects the snapshots it is given. Display order is imposed
//! here: folders first, then names compared case-insensitively.

use std::{cmp::Ordering, collections::BTreeSet};

use crate::{
    path::{FsPath, FsPathBuf},
    tree::TreeNode,
    NodeKind,
};

/// A visible line of the explorer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub depth: usize,
    pub name: String,
    pub path: FsPathBuf,
    pub kind: NodeKind,
    pub expanded: bool,
}

#[derive(Debug, Default)]
pub struct Explorer {
    tree: Option<TreeNode>,
    expanded: BTreeSet<FsPathBuf>,
    selected: Option<FsPathBuf>,
}

pub fn display_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.is_folder(), b.is_folder()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name()
            .to_lowercase()
            .cmp(&b.name().to_lowercase())
            .then_with(|| a.name().cmp(b.name())),
    }
}

/// Children of `node` in display order
pub fn sorted_children(node: &TreeNode) -> Vec<&TreeNode> {
    let mut children: Vec<_> = node.children().iter().collect();
    children.sort_by(|a, b| display_order(a, b));
    children
}

impl Explorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Replace the displayed tree.
    /// Expansion and selection survive for paths still present in the new tree.
    pub fn apply_snapshot(&mut self, tree: TreeNode) {
        let root_changed = self.tree.as_ref().map(|t| t.path()) != Some(tree.path());
        if root_changed {
            self.expanded.clear();
            self.expanded.insert(tree.path().to_owned());
            self.selected = None;
        } else {
            self.expanded
                .retain(|p| tree.find(p).map(|n| n.is_folder()).unwrap_or(false));
            if let Some(sel) = &self.selected {
                if !tree.contains(sel) {
                    self.selected = None;
                }
            }
        }
        self.tree = Some(tree);
    }

    pub fn is_expanded(&self, path: &FsPath) -> bool {
        self.expanded.contains(path)
    }

    /// Toggle the folder at `path`, returning whether it is now expanded.
    /// Files and unknown paths are left untouched.
    pub fn toggle(&mut self, path: &FsPath) -> bool {
        let is_folder = self
            .tree
            .as_ref()
            .and_then(|t| t.find(path))
            .map(|n| n.is_folder())
            .unwrap_or(false);
        if !is_folder {
            return false;
        }
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_owned());
            true
        } else {
            false
        }
    }

    pub fn select(&mut self, path: &FsPath) -> bool {
        let exists = self.tree.as_ref().is_some_and(|t| t.contains(path));
        if exists {
            self.selected = Some(path.to_owned());
        }
        exists
    }

    pub fn selected(&self) -> Option<&FsPath> {
        self.selected.as_deref()
    }

    /// Visible rows, the root included
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        if let Some(tree) = &self.tree {
            self.push_rows(tree, 0, &mut rows);
        }
        rows
    }

    fn push_rows(&self, node: &TreeNode, depth: usize, rows: &mut Vec<Row>) {
        let expanded = node.is_folder() && self.is_expanded(node.path());
        rows.push(Row {
            depth,
            name: node.name().to_string(),
            path: node.path().to_owned(),
            kind: node.kind(),
            expanded,
        });
        if expanded {
            for child in sorted_children(node) {
                self.push_rows(child, depth + 1, rows);
            }
        }
    }
}
