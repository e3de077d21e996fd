use std::process::ExitCode;

use clap::Parser;

mod config;
mod run;
mod sync;
mod tree;
mod utils;

#[derive(Parser)]
#[command(name = "wsynctl")]
#[command(author, version, about, long_about=None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Edit the server and sync tool settings
    Config(config::Args),
    /// Print the tree of a workspace
    Tree(tree::Args),
    /// Mirror a workspace to the server
    Sync(sync::Args),
    /// Mirror a workspace and run one of its files on the server
    Run(run::Args),
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let res = match cli.command {
        Commands::Config(args) => config::main(args).await,
        Commands::Tree(args) => tree::main(args).await,
        Commands::Sync(args) => sync::main(args).await,
        Commands::Run(args) => run::main(args).await,
    };
    match res {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
