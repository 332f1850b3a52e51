use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RipplefeedConfig {
    pub api_port: u16,
    pub paths: RipplefeedPaths,
}

impl RipplefeedConfig {
    pub fn from_env() -> Result<Self> {
        let paths = RipplefeedPaths::discover()?;
        let api_port = env::var("RIPPLEFEED_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        Ok(Self { api_port, paths })
    }

    pub fn new(api_port: u16, paths: RipplefeedPaths) -> Self {
        Self { api_port, paths }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RipplefeedPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl RipplefeedPaths {
    /// Resolves the base directory from `RIPPLEFEED_DATA_DIR` or, failing
    /// that, the directory the executable lives in.
    pub fn discover() -> Result<Self> {
        if let Ok(base) = env::var("RIPPLEFEED_DATA_DIR") {
            if !base.trim().is_empty() {
                return Self::from_base_dir(base);
            }
        }
        let exe_path = env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("ripplefeed.db");
        let logs_dir = base.join("logs");
        Ok(Self {
            base,
            data_dir,
            db_path,
            logs_dir,
        })
    }
}
