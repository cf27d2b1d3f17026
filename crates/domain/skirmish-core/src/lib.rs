use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod options;
pub mod script;
pub mod settings;

pub use options::OptionTable;
pub use script::{render_script, ScriptContext};
pub use settings::{EngineSettings, SettingsError, SettingsPatch};

/// Parameters of a single bot match, rendered into the start script.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchOptions {
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub mod_options: OptionTable,
    #[serde(default)]
    pub map_options: OptionTable,
    #[serde(default)]
    pub game_options: OptionTable,
}

/// Everything needed to start one engine process. Built fresh per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub engine_path: Utf8PathBuf,
    pub write_dir: Utf8PathBuf,
    pub isolation: bool,
    /// `true`: render `script.txt` and pass it to the engine.
    /// `false`: only write the connection descriptor.
    pub use_external_config_file: bool,
    /// Remove the engine directory when the binary is missing so the next
    /// start reinstalls it.
    pub purge_missing_engine_dir: bool,
    pub match_options: MatchOptions,
    pub settings: SettingsPatch,
}

impl LaunchRequest {
    pub fn new(engine_path: impl Into<Utf8PathBuf>, write_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            write_dir: write_dir.into(),
            isolation: false,
            use_external_config_file: true,
            purge_missing_engine_dir: true,
            match_options: MatchOptions::default(),
            settings: SettingsPatch::default(),
        }
    }
}

/// Local endpoint the engine connects back to. Published once by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendezvous {
    pub address: String,
    pub port: u16,
}

impl fmt::Display for Rendezvous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Written as `sl-connection.json` when no start script is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    #[serde(rename = "_sl_address")]
    pub address: String,
    #[serde(rename = "_sl_port")]
    pub port: u16,
    #[serde(rename = "_sl_write_path")]
    pub write_path: String,
    #[serde(rename = "_sl_launcher_version")]
    pub launcher_version: String,
}

impl ConnectionDescriptor {
    pub fn new(rendezvous: &Rendezvous, write_path: &str, launcher_version: &str) -> Self {
        Self {
            address: rendezvous.address.clone(),
            port: rendezvous.port,
            write_path: write_path.to_string(),
            launcher_version: launcher_version.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProcessState {
    #[default]
    Idle,
    Running,
    Finished {
        exit_code: i32,
    },
    Failed {
        /// Only set when the process actually exited.
        exit_code: Option<i32>,
        reason: String,
    },
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    Stdout(String),
    Stderr(String),
    Finished(i32),
    Failed(String),
}

impl LaunchEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_) | Self::Failed(_))
    }
}
