use std::process::ExitCode;

use systemd_journal_logger::{connected_to_journal, JournalLog};
use tokio::task::JoinHandle;

use crate::ShutdownRef;

pub fn main() -> ExitCode {
    init_logger();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            log::error!("Can't start the runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(async move {
        let shutdown_ref = ShutdownRef::new();
        let shutdown = match handle_shutdown_signals(shutdown_ref.clone()) {
            Ok(shutdown) => shutdown,
            Err(err) => {
                log::error!("Can't install signal handlers: {err}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(err) = crate::run(std::env::args_os().collect(), shutdown_ref).await {
            log::error!("{err:#}");
            return ExitCode::FAILURE;
        }
        match shutdown.await {
            Ok(res) => crate::exit_program(res),
            Err(err) => crate::exit_program(Err(err.into())),
        }
    })
}

fn init_logger() {
    if connected_to_journal() {
        let journal = JournalLog::new()
            .map(|j| j.add_extra_field("VERSION", env!("CARGO_PKG_VERSION")))
            .and_then(|j| j.install().map_err(std::io::Error::other));
        match journal {
            Ok(()) => {
                log::set_max_level(log::LevelFilter::Info);
                return;
            }
            Err(err) => eprintln!("journal logging unavailable: {err}"),
        }
    }
    env_logger::init();
}

fn handle_shutdown_signals(
    shutdown_ref: ShutdownRef,
) -> std::io::Result<JoinHandle<anyhow::Result<()>>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sig_term = signal(SignalKind::terminate())?;
    let mut sig_int = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = sig_term.recv() => {
                log::warn!("received SIGTERM");
            }
            _ = sig_int.recv() => {
                log::warn!("received SIGINT");
            }
        };
        shutdown_ref.shutdown().await
    }))
}
