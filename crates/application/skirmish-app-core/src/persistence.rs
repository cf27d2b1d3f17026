use crate::domain::LauncherConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use skirmish_config::LAUNCHER_CONFIG_FILE_NAME;
use skirmish_infra::atomic_write;
use std::fs;
use std::path::{Path, PathBuf};

const QUALIFIER: &str = "org";
const ORG: &str = "skirmish";
const APP: &str = "launcher";

/// Reads and writes `config.json`.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `config.json` in the platform config directory.
    pub fn default_location() -> Result<Self> {
        let proj_dirs = ProjectDirs::from(QUALIFIER, ORG, APP)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self::at(proj_dirs.config_dir().join(LAUNCHER_CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the default configuration.
    pub fn load(&self) -> Result<LauncherConfig> {
        if !self.path.exists() {
            return Ok(LauncherConfig::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(config)
    }

    pub fn save(&self, config: &LauncherConfig) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(config)?;
        atomic_write(&self.path, json.as_bytes()).context("Failed to write launcher config")?;
        Ok(())
    }
}
