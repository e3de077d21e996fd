use std::future::Future;

use inquire::validator::{ErrorMessage, Validation};
use inquire::CustomUserError;
use wsync::path::{FsPath, FsPathBuf};
use wsync::SyncCredentials;
use wsyncd::{
    credentials::CredentialStore,
    remote::HttpRemote,
    tool::{ProcessRunner, SyncTool},
    Engine, OutputLog,
};

pub fn store(settings: Option<FsPathBuf>) -> anyhow::Result<CredentialStore> {
    match settings {
        Some(path) => Ok(CredentialStore::new(
            path,
            wsyncd::credentials::DefaultSource::Builtin,
        )),
        None => CredentialStore::for_user(),
    }
}

pub async fn load_credentials(settings: Option<FsPathBuf>) -> anyhow::Result<SyncCredentials> {
    store(settings)?.load().await
}

pub fn engine() -> anyhow::Result<Engine<HttpRemote, ProcessRunner>> {
    Ok(Engine::new(
        HttpRemote::new()?,
        SyncTool::new(ProcessRunner),
        OutputLog::new(),
    ))
}

pub async fn canonical_dir(path: &FsPath) -> anyhow::Result<FsPathBuf> {
    let path = tokio::fs::canonicalize(path).await?;
    let path = FsPathBuf::try_from(path)?;
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {path}");
    }
    Ok(path)
}

/// Drive `fut` to completion, printing the output lines as they come
pub async fn with_output<F>(log: &OutputLog, fut: F) -> F::Output
where
    F: Future,
{
    let mut rx = log.subscribe();
    tokio::pin!(fut);
    let res = loop {
        tokio::select! {
            res = &mut fut => break res,
            Ok(line) = rx.recv() => println!("{line}"),
        }
    };
    while let Ok(line) = rx.try_recv() {
        println!("{line}");
    }
    res
}

fn validate_chars(mut invalid_chars: Vec<&str>) -> Result<Validation, CustomUserError> {
    invalid_chars.sort_unstable();
    invalid_chars.dedup();
    if invalid_chars.is_empty() {
        Ok(Validation::Valid)
    } else {
        let invalid_chars = invalid_chars.join(", ");
        Ok(Validation::Invalid(ErrorMessage::Custom(format!(
            "invalid characters: {invalid_chars}"
        ))))
    }
}

pub fn validate_host(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        return Ok(Validation::Invalid("the server address is required".into()));
    }
    let mut invalid_chars = Vec::new();
    for c in input.as_bytes() {
        match *c {
            b'/' => invalid_chars.push("/"),
            b'\\' => invalid_chars.push("\\"),
            b'@' => invalid_chars.push("@"),
            b' ' => invalid_chars.push("<space>"),
            0..=31 => invalid_chars.push("<ctrl>"),
            _ => (),
        }
    }
    validate_chars(invalid_chars)
}

pub fn validate_user(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        return Ok(Validation::Invalid("the user name is required".into()));
    }
    let mut invalid_chars = Vec::new();
    for c in input.as_bytes() {
        match *c {
            b'@' => invalid_chars.push("@"),
            b':' => invalid_chars.push(":"),
            b' ' => invalid_chars.push("<space>"),
            0..=31 => invalid_chars.push("<ctrl>"),
            _ => (),
        }
    }
    validate_chars(invalid_chars)
}

fn map_error_message(msg: ErrorMessage) -> anyhow::Error {
    match msg {
        ErrorMessage::Default => anyhow::anyhow!("Invalid input"),
        ErrorMessage::Custom(msg) => anyhow::anyhow!("{msg}"),
    }
}

pub fn map_validation_result(res: Result<Validation, CustomUserError>) -> anyhow::Result<()> {
    match res {
        Ok(Validation::Valid) => Ok(()),
        Ok(Validation::Invalid(msg)) => Err(map_error_message(msg)),
        Err(err) => Err(anyhow::anyhow!("{err}")),
    }
}
