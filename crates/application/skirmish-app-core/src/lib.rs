mod async_runtime;
pub mod domain;
pub mod orchestrator;
pub mod persistence;
pub mod ports;
pub mod settings;

pub use domain::{LaunchSettings, LauncherConfig};
pub use orchestrator::LaunchOrchestrator;
pub use persistence::ConfigStore;
pub use ports::*;
pub use settings::FileEngineSettings;
