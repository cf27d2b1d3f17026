use anyhow::bail;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use skirmish_core::{LaunchRequest, MatchOptions, SettingsPatch};

/// Launcher configuration as stored in `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherConfig {
    pub engine_path: String,
    pub write_path: String,
    pub isolation: bool,
    /// Write `sl-connection.json` instead of a start script.
    pub no_start_script: bool,
    pub disable_engine_folder_deletion: bool,
    pub launch: LaunchSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LaunchSettings {
    #[serde(flatten)]
    pub match_options: MatchOptions,
    pub springsettings: SettingsPatch,
}

impl LauncherConfig {
    pub fn to_request(&self) -> anyhow::Result<LaunchRequest> {
        if self.engine_path.trim().is_empty() {
            bail!("No engine path configured");
        }
        if self.write_path.trim().is_empty() {
            bail!("No write path configured");
        }

        Ok(LaunchRequest {
            engine_path: Utf8PathBuf::from(&self.engine_path),
            write_dir: Utf8PathBuf::from(&self.write_path),
            isolation: self.isolation,
            use_external_config_file: !self.no_start_script,
            purge_missing_engine_dir: !self.disable_engine_folder_deletion,
            match_options: self.launch.match_options.clone(),
            settings: self.launch.springsettings.clone(),
        })
    }
}
