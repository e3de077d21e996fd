use std::process::ExitCode;

use wsync::path::FsPathBuf;
use wsyncd::{files, run};

use crate::utils;

#[derive(clap::Args)]
pub struct Args {
    /// Settings file (the per-user one if not specified)
    #[clap(long, short = 's')]
    settings: Option<FsPathBuf>,

    /// The workspace directory
    #[clap(long, short = 'w', default_value = ".")]
    root: FsPathBuf,

    /// The file to run, inside the workspace
    file: FsPathBuf,
}

pub async fn main(args: Args) -> anyhow::Result<ExitCode> {
    let credentials = utils::load_credentials(args.settings).await?;
    let root = utils::canonical_dir(&args.root).await?;
    let file = tokio::fs::canonicalize(&args.file).await?;
    let file = FsPathBuf::try_from(file)?;
    let content = files::read_file(&file).await?;

    let engine = utils::engine()?;
    let res = utils::with_output(
        engine.log(),
        run::run_remote(&engine, Some(&root), &credentials, &file, content),
    )
    .await;

    match res {
        Ok(result) => {
            if !result.stdout.is_empty() {
                print!("{}", result.stdout);
            }
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
            let code = match result.exit_code {
                Some(code) => u8::try_from(code).unwrap_or(1),
                None if result.success => 0,
                None => 1,
            };
            Ok(ExitCode::from(code))
        }
        // already reported to the output
        Err(err) => {
            log::debug!("{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
