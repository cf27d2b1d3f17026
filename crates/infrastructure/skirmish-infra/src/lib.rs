pub mod bridge;
pub mod fs_utils;
pub mod launcher;
pub mod settings_store;

// Re-exports for convenience
pub use bridge::Bridge;
pub use fs_utils::{absolute_path, atomic_write};
pub use launcher::{LaunchError, LaunchHandle, Launcher, Lifecycle};
pub use settings_store::{FileSettingsStore, SettingsStoreError};
