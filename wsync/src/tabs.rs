//! Editor tab bookkeeping.

use crate::{
    path::{FsPath, FsPathBuf},
    tree::TreeNode,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    path: FsPathBuf,
    content: String,
    saved: String,
    missing: bool,
}

impl Tab {
    pub fn path(&self) -> &FsPath {
        &self.path
    }

    pub fn title(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content differs from what was last read or written
    pub fn is_dirty(&self) -> bool {
        self.content != self.saved
    }

    /// The file is not in the latest snapshot anymore
    pub fn is_missing(&self) -> bool {
        self.missing
    }

    pub fn language(&self) -> Option<&'static str> {
        language_hint(&self.path)
    }
}

#[derive(Debug, Default)]
pub struct Tabs {
    tabs: Vec<Tab>,
    active: Option<usize>,
}

impl Tabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active.map(|idx| &self.tabs[idx])
    }

    pub fn get(&self, path: &FsPath) -> Option<&Tab> {
        self.position(path).map(|idx| &self.tabs[idx])
    }

    fn position(&self, path: &FsPath) -> Option<usize> {
        self.tabs.iter().position(|t| t.path == path)
    }

    /// Open `path` with the content read from disk, or focus it if already open.
    /// An open tab keeps its in-editor content.
    pub fn open(&mut self, path: &FsPath, content: String) -> &Tab {
        let idx = match self.position(path) {
            Some(idx) => idx,
            None => {
                self.tabs.push(Tab {
                    path: path.to_owned(),
                    saved: content.clone(),
                    content,
                    missing: false,
                });
                self.tabs.len() - 1
            }
        };
        self.active = Some(idx);
        &self.tabs[idx]
    }

    pub fn activate(&mut self, path: &FsPath) -> bool {
        match self.position(path) {
            Some(idx) => {
                self.active = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Record an edit made in the editor widget
    pub fn edit(&mut self, path: &FsPath, content: String) -> bool {
        match self.position(path) {
            Some(idx) => {
                self.tabs[idx].content = content;
                true
            }
            None => false,
        }
    }

    /// Record that the tab content was written to disk
    pub fn mark_saved(&mut self, path: &FsPath) -> bool {
        match self.position(path) {
            Some(idx) => {
                let tab = &mut self.tabs[idx];
                tab.saved = tab.content.clone();
                tab.missing = false;
                true
            }
            None => false,
        }
    }

    /// Close the tab of `path`. The next tab, or the previous one when the last
    /// tab is closed, becomes active.
    pub fn close(&mut self, path: &FsPath) -> Option<Tab> {
        let idx = self.position(path)?;
        let tab = self.tabs.remove(idx);
        self.active = match self.active {
            _ if self.tabs.is_empty() => None,
            Some(active) if active > idx => Some(active - 1),
            Some(active) if active == idx => Some(idx.min(self.tabs.len() - 1)),
            other => other,
        };
        Some(tab)
    }

    /// Flag tabs whose file is absent from `tree`
    pub fn reconcile(&mut self, tree: &TreeNode) {
        for tab in self.tabs.iter_mut() {
            tab.missing = !tree.contains(&tab.path);
        }
    }
}

/// Syntax highlighting hint from the file extension
pub fn language_hint(path: &FsPath) -> Option<&'static str> {
    let ext = path.extension()?.to_ascii_lowercase();
    let lang = match ext.as_str() {
        "py" | "pyw" => "python",
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "java" => "java",
        "go" => "go",
        "sh" | "bash" => "shell",
        "json" => "json",
        "toml" => "toml",
        "yml" | "yaml" => "yaml",
        "md" => "markdown",
        "html" | "htm" => "html",
        "css" => "css",
        _ => return None,
    };
    Some(lang)
}
