use camino::Utf8Path;
use skirmish_core::SettingsPatch;

/// The engine's own settings store, updated before every launch.
pub trait EngineSettingsPort: Send + Sync + 'static {
    fn apply(&self, write_dir: &Utf8Path, patch: &SettingsPatch) -> anyhow::Result<()>;
}
