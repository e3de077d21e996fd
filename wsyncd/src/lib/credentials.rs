//! Persistence of the sync credentials.

use anyhow::Context;
use wsync::{
    config::BUILTIN_DEFAULT,
    loc,
    path::{FsPath, FsPathBuf},
    SyncCredentials,
};

use crate::tool::{CommandRunner, SyncTool};

/// Where the default settings come from on first run
#[derive(Debug, Clone)]
pub enum DefaultSource {
    /// A file shipped with the application, falling back to the built-in default
    /// if it is missing
    File(FsPathBuf),
    Builtin,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: FsPathBuf,
    default: DefaultSource,
}

impl CredentialStore {
    pub fn new(path: FsPathBuf, default: DefaultSource) -> Self {
        Self { path, default }
    }

    /// Store in the per-user location, seeded from the default shipped next to
    /// the executable
    pub fn for_user() -> anyhow::Result<Self> {
        let path = loc::user::settings_file()?;
        let default = match loc::bundle::default_settings_file() {
            Ok(file) => DefaultSource::File(file),
            Err(err) => {
                log::debug!("no bundled settings: {err:#}");
                DefaultSource::Builtin
            }
        };
        Ok(Self::new(path, default))
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    /// Read the persisted settings.
    /// On first run the default settings are copied to the persisted location.
    pub async fn load(&self) -> anyhow::Result<SyncCredentials> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to check settings file {}", self.path))?;
        if !exists {
            let json = self.default_json().await?;
            log::info!("Seeding settings file {}", self.path);
            write_atomic(&self.path, json.as_bytes()).await?;
        }
        SyncCredentials::load_from_file(&self.path).await
    }

    async fn default_json(&self) -> anyhow::Result<String> {
        match &self.default {
            DefaultSource::File(file) if file.exists() => {
                log::debug!("Using bundled settings {file}");
                tokio::fs::read_to_string(file)
                    .await
                    .with_context(|| format!("Failed to read bundled settings {file}"))
            }
            _ => Ok(BUILTIN_DEFAULT.to_string()),
        }
    }

    /// Persist `credentials`, then recreate the sync tool profile.
    ///
    /// Failing to create the profile is logged but does not fail the save: the
    /// next mirror attempt reports the actual problem.
    pub async fn save<C>(
        &self,
        credentials: &SyncCredentials,
        tool: &SyncTool<C>,
    ) -> anyhow::Result<()>
    where
        C: CommandRunner,
    {
        let json = credentials.to_json()?;
        write_atomic(&self.path, json.as_bytes()).await?;
        log::info!("Settings saved to {}", self.path);

        if let Err(err) = tool.provision(credentials).await {
            log::warn!("{err:#}");
        }
        Ok(())
    }
}

/// Write `data` to a sibling temporary file, then move it over `path`
pub async fn write_atomic(path: &FsPath, data: &[u8]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        log::trace!("mkdir -p {dir}");
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {dir}"))?;
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("{path} is not a file path"))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    tokio::fs::write(&tmp, data)
        .await
        .with_context(|| format!("Failed to write {tmp}"))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {path}"))?;
    Ok(())
}
