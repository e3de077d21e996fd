//! Immutable snapshots of a workspace directory tree.

use serde::{Deserialize, Serialize};

use crate::{
    path::{FsPath, FsPathBuf},
    NodeKind,
};

/// One entry of a snapshot.
///
/// The path of a child is always the path of its parent joined with the
/// child's name. A new snapshot is always a new tree, nodes are never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    name: String,
    path: FsPathBuf,
    kind: NodeKind,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn file(name: String, path: FsPathBuf) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    pub fn folder(name: String, path: FsPathBuf, children: Vec<TreeNode>) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::Folder,
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Find the node at `path` in this tree
    pub fn find(&self, path: &FsPath) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    /// Whether a node exists at `path`
    pub fn contains(&self, path: &FsPath) -> bool {
        self.find(path).is_some()
    }

    /// Depth-first iterator over this node and all its descendants
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Paths of this node and every descendant folder
    pub fn folder_paths(&self) -> impl Iterator<Item = &FsPath> {
        self.iter().filter(|n| n.is_folder()).map(|n| n.path())
    }

    /// Number of files and folders below this node
    pub fn count(&self) -> (usize, usize) {
        self.iter().skip(1).fold((0, 0), |(files, folders), n| {
            if n.is_folder() {
                (files, folders + 1)
            } else {
                (files + 1, folders)
            }
        })
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
