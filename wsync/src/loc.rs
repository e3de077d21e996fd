//! Locations module

/// Locations for the user
pub mod user {
    use crate::path::FsPathBuf;

    pub fn home_dir() -> anyhow::Result<FsPathBuf> {
        let dir = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Can't get HOME directory"))?;
        Ok(FsPathBuf::try_from(dir)?)
    }

    pub fn config_dir() -> anyhow::Result<FsPathBuf> {
        let dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Can't get config directory"))?;
        let dir = FsPathBuf::try_from(dir)?;
        Ok(dir.join("wsync"))
    }

    /// Persisted settings record
    pub fn settings_file() -> anyhow::Result<FsPathBuf> {
        Ok(config_dir()?.join("settings.json"))
    }
}

/// Locations of files shipped with the application
pub mod bundle {
    use crate::path::FsPathBuf;

    pub const DEFAULT_SETTINGS_NAME: &str = "settings.default.json";

    /// Directory containing the running executable
    pub fn exe_dir() -> anyhow::Result<FsPathBuf> {
        let exe = std::env::current_exe()?;
        let exe = FsPathBuf::try_from(exe)?;
        exe.parent()
            .map(ToOwned::to_owned)
            .ok_or_else(|| anyhow::anyhow!("Executable {exe} has no parent directory"))
    }

    /// Default settings shipped alongside the executable
    pub fn default_settings_file() -> anyhow::Result<FsPathBuf> {
        Ok(exe_dir()?.join(DEFAULT_SETTINGS_NAME))
    }
}
