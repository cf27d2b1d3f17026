pub mod commands;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use skirmish_app_core::{ConfigStore, LauncherConfig};

/// Command-line flags that take precedence over `config.json`.
#[derive(Debug, Clone, Default)]
pub struct LaunchOverrides {
    pub engine: Option<Utf8PathBuf>,
    pub write_dir: Option<Utf8PathBuf>,
    pub isolation: bool,
    pub no_start_script: bool,
}

impl LaunchOverrides {
    /// Flags only ever switch behaviour on; an absent flag keeps the file value.
    pub fn apply(&self, config: &mut LauncherConfig) {
        if let Some(engine) = &self.engine {
            config.engine_path = engine.to_string();
        }
        if let Some(dir) = &self.write_dir {
            config.write_path = dir.to_string();
        }
        config.isolation |= self.isolation;
        config.no_start_script |= self.no_start_script;
    }
}

/// `--config FILE` or the platform default.
pub fn config_store(path: Option<Utf8PathBuf>) -> Result<ConfigStore> {
    match path {
        Some(p) => Ok(ConfigStore::at(p.into_std_path_buf())),
        None => ConfigStore::default_location().context("No --config given"),
    }
}
