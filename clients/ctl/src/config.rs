use std::process::ExitCode;

use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use wsync::{path::FsPathBuf, SyncCredentials};
use wsyncd::tool::{ProcessRunner, SyncTool};

use crate::utils;

#[derive(clap::Args)]
pub struct Args {
    /// Settings file (the per-user one if not specified)
    #[clap(long, short = 's')]
    settings: Option<FsPathBuf>,

    /// Address of the server
    #[clap(long)]
    host: Option<String>,

    /// User name on the server
    #[clap(long, short = 'u')]
    user: Option<String>,

    /// Path to the sync tool executable
    #[clap(long)]
    tool_path: Option<String>,

    /// Auto-sync period in seconds (0 disables auto-sync)
    #[clap(long, short = 'i')]
    interval: Option<u64>,

    /// Don't prompt for the password, keep the current one
    #[clap(long)]
    keep_password: bool,

    /// Print the current settings and exit
    #[clap(long)]
    show: bool,
}

pub async fn main(args: Args) -> anyhow::Result<ExitCode> {
    let store = utils::store(args.settings)?;
    let current = store.load().await?;

    if args.show {
        print_settings(&current);
        return Ok(ExitCode::SUCCESS);
    }

    let host = if let Some(host) = args.host {
        utils::map_validation_result(utils::validate_host(&host))?;
        host
    } else {
        Text::new("Server address?")
            .with_initial_value(&current.host)
            .with_validator(utils::validate_host)
            .prompt()?
    };

    let user = if let Some(user) = args.user {
        utils::map_validation_result(utils::validate_user(&user))?;
        user
    } else {
        Text::new("User name?")
            .with_initial_value(&current.user)
            .with_validator(utils::validate_user)
            .prompt()?
    };

    let secret = if args.keep_password {
        current.secret.clone()
    } else {
        let secret = Password::new("Password? (empty keeps the current one)")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()?;
        if secret.is_empty() {
            current.secret.clone()
        } else {
            secret
        }
    };

    let sync_tool_path = match args.tool_path {
        Some(path) => path,
        None => Text::new("Sync tool executable?")
            .with_default(&current.sync_tool_path)
            .with_help_message("a bare name is looked up in PATH")
            .prompt()?,
    };

    let interval_seconds = match args.interval {
        Some(interval) => interval,
        None => CustomType::<u64>::new("Auto-sync period in seconds?")
            .with_default(current.interval_seconds)
            .with_help_message("0 disables auto-sync")
            .with_error_message("Please type a positive number")
            .prompt()?,
    };

    let credentials = SyncCredentials {
        host: host.trim().to_string(),
        user: user.trim().to_string(),
        secret,
        sync_tool_path,
        interval_seconds,
    };

    store
        .save(&credentials, &SyncTool::new(ProcessRunner))
        .await?;
    println!("Settings written to {}", store.path());
    Ok(ExitCode::SUCCESS)
}

fn print_settings(credentials: &SyncCredentials) {
    let secret = if credentials.secret.is_empty() {
        "(none)"
    } else {
        "(set)"
    };
    println!("host:      {}", credentials.host);
    println!("user:      {}", credentials.user);
    println!("password:  {secret}");
    println!("sync tool: {}", credentials.sync_tool_path);
    match credentials.interval_seconds {
        0 => println!("auto-sync: disabled"),
        secs => println!("auto-sync: every {secs}s"),
    }
}
