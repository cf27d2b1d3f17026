use anyhow::Context;
use camino::Utf8Path;
use skirmish_core::SettingsPatch;
use skirmish_infra::FileSettingsStore;

use crate::ports::EngineSettingsPort;

/// Writes settings into `springsettings.cfg` inside the write directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileEngineSettings;

impl EngineSettingsPort for FileEngineSettings {
    fn apply(&self, write_dir: &Utf8Path, patch: &SettingsPatch) -> anyhow::Result<()> {
        let store = FileSettingsStore::in_write_dir(write_dir);
        store
            .apply(patch)
            .with_context(|| format!("Failed to apply engine settings to {}", store.path()))?;
        Ok(())
    }
}
