use std::process::ExitCode;

use wsync::path::FsPathBuf;

use crate::utils;

#[derive(clap::Args)]
pub struct Args {
    /// Settings file (the per-user one if not specified)
    #[clap(long, short = 's')]
    settings: Option<FsPathBuf>,

    /// The workspace directory (current directory if not specified)
    root: Option<FsPathBuf>,
}

pub async fn main(args: Args) -> anyhow::Result<ExitCode> {
    let credentials = utils::load_credentials(args.settings).await?;
    let root = args.root.unwrap_or_else(|| FsPathBuf::from("."));
    let root = utils::canonical_dir(&root).await?;

    let engine = utils::engine()?;
    let outcome = utils::with_output(
        engine.log(),
        engine.sync_workspace(Some(&root), &credentials),
    )
    .await;

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
