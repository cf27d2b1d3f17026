//! Central constants for launch artifacts, retry policy and user-facing text.

use std::time::Duration;

/// Version reported to the engine as `_sl_launcher_version`.
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Start script handed to the engine as its last argument.
pub const SCRIPT_FILE_NAME: &str = "script.txt";

/// Connection descriptor written instead of the start script.
pub const CONNECTION_FILE_NAME: &str = "sl-connection.json";

/// The engine's own settings store inside the write directory.
pub const ENGINE_SETTINGS_FILE_NAME: &str = "springsettings.cfg";

/// Launcher configuration file inside the platform config directory.
pub const LAUNCHER_CONFIG_FILE_NAME: &str = "config.json";

/// Retries after the first attempt when purging a broken engine directory.
pub const PURGE_MAX_RETRIES: u32 = 5;

/// Back-off unit between purge attempts; attempt `n` waits `n` units.
pub const PURGE_RETRY_DELAY: Duration = Duration::from_millis(100);

pub const MISSING_ENGINE_MESSAGE: &str = "Failed to launch: Engine binary not found. This sometimes happens \
during engine updates when a new version is incorrectly deleted or \
blocked by antivirus. Resolve the issue with antivirus (E.g., \
<a target=\"_blank\" href=\"https://www.google.com/search?q=How+to+add+a+folder+to+%3Cyour+antivirus%3E+antivirus+exclusion+list\">\
add install folder to exceptions list</a>) and restart \
the launcher.";

/// Linear back-off for purge attempt `attempt` (1-based).
pub fn purge_backoff(attempt: u32) -> Duration {
    PURGE_RETRY_DELAY * attempt
}
