use std::process::ExitCode;

use wsync::{explorer, path::FsPathBuf, tree::TreeNode};
use wsyncd::snapshot;

use crate::utils;

#[derive(clap::Args)]
pub struct Args {
    /// The workspace directory (current directory if not specified)
    root: Option<FsPathBuf>,
}

pub async fn main(args: Args) -> anyhow::Result<ExitCode> {
    let root = args.root.unwrap_or_else(|| FsPathBuf::from("."));
    let root = utils::canonical_dir(&root).await?;

    let Some(tree) = snapshot::build(&root).await else {
        anyhow::bail!("Can't read {root}");
    };

    println!("{}", tree.path());
    walk(&tree, "");

    let (files, folders) = tree.count();
    println!("\n{folders} folders, {files} files");
    Ok(ExitCode::SUCCESS)
}

// all special unicode are from "box drawing" block starting at \u{2500}

fn walk(node: &TreeNode, prefix: &str) {
    let children = explorer::sorted_children(node);
    let mut len = children.len();
    for child in children {
        len -= 1;
        let has_follower = len != 0;
        let tail = if has_follower { "├─ " } else { "└─ " };
        if child.is_folder() {
            println!("{prefix}{tail}{}/", child.name());
            let prefix = if has_follower {
                format!("{prefix}│  ")
            } else {
                format!("{prefix}   ")
            };
            walk(child, &prefix);
        } else {
            println!("{prefix}{tail}{}", child.name());
        }
    }
}
