//! Builds [TreeNode] snapshots of a local directory.

use futures::future::BoxFuture;
use tokio::fs;
use wsync::{
    path::{FsPath, FsPathBuf},
    tree::TreeNode,
};

/// Snapshot the directory at `path`.
///
/// Returns `None` if `path` is not a readable directory. Children keep the order of
/// the directory listing. A subdirectory that can't be read, e.g. because it was
/// removed during the walk, is reported with no children.
pub async fn build(path: &FsPath) -> Option<TreeNode> {
    let md = fs::metadata(path).await.ok()?;
    if !md.is_dir() {
        return None;
    }
    let read_dir = fs::read_dir(path).await.ok()?;
    let name = wsync::path::folder_name(path)
        .unwrap_or(path.as_str())
        .to_string();
    let children = walk_entries(path.to_owned(), read_dir).await;
    Some(TreeNode::folder(name, path.to_owned(), children))
}

fn walk_dir(path: FsPathBuf) -> BoxFuture<'static, Vec<TreeNode>> {
    Box::pin(async move {
        match fs::read_dir(&path).await {
            Ok(read_dir) => walk_entries(path, read_dir).await,
            Err(err) => {
                log::debug!("can't list {path}: {err}");
                Vec::new()
            }
        }
    })
}

fn walk_entries(path: FsPathBuf, mut read_dir: fs::ReadDir) -> BoxFuture<'static, Vec<TreeNode>> {
    Box::pin(async move {
        let mut children = Vec::new();
        loop {
            let entry = match read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    log::debug!("listing of {path} interrupted: {err}");
                    break;
                }
            };
            let Ok(name) = entry.file_name().into_string() else {
                log::warn!("skipping non UTF-8 entry in {path}");
                continue;
            };
            let child_path = path.join(&name);
            // symlinks are not followed, a linked folder shows as a file
            let is_dir = entry
                .file_type()
                .await
                .map(|ft| ft.is_dir())
                .unwrap_or(false);
            if is_dir {
                let grandchildren = walk_dir(child_path.clone()).await;
                children.push(TreeNode::folder(name, child_path, grandchildren));
            } else {
                children.push(TreeNode::file(name, child_path));
            }
        }
        children
    })
}
