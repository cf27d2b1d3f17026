use camino::{Utf8Path, Utf8PathBuf};
use skirmish_config::ENGINE_SETTINGS_FILE_NAME;
use skirmish_core::{EngineSettings, SettingsError, SettingsPatch};
use std::io;
use thiserror::Error;
use tracing::debug;

use crate::fs_utils::atomic_write;

#[derive(Debug, Error)]
pub enum SettingsStoreError {
    #[error(transparent)]
    Invalid(#[from] SettingsError),
    #[error("failed to access {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The engine's `springsettings.cfg`, read and rewritten in place.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: Utf8PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_write_dir(write_dir: &Utf8Path) -> Self {
        Self::new(write_dir.join(ENGINE_SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// A missing file reads as empty settings.
    pub fn load(&self) -> Result<EngineSettings, SettingsStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(EngineSettings::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EngineSettings::default()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Applies the patch and rewrites the file if anything changed. The
    /// patch is validated before the file is touched.
    pub fn apply(&self, patch: &SettingsPatch) -> Result<usize, SettingsStoreError> {
        patch.validate()?;
        if patch.is_empty() {
            return Ok(0);
        }

        let mut settings = self.load()?;
        let changed = settings.apply(patch)?;
        if changed == 0 {
            debug!("Engine settings at {} already up to date", self.path);
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        atomic_write(self.path.as_std_path(), settings.render().as_bytes())
            .map_err(|e| self.io_error(e))?;
        debug!("Updated {changed} engine setting(s) in {}", self.path);
        Ok(changed)
    }

    fn io_error(&self, source: io::Error) -> SettingsStoreError {
        SettingsStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::OptionTable;

    fn write_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn creates_file_with_defaults_and_overrides() {
        let (_guard, dir) = write_dir();
        let store = FileSettingsStore::in_write_dir(&dir);

        let patch = SettingsPatch {
            defaults: [("Fullscreen", "0")].into_iter().collect::<OptionTable>(),
            overrides: [("LuaAutoModWidgets", "1")].into_iter().collect(),
        };
        assert_eq!(store.apply(&patch).unwrap(), 2);

        let text = std::fs::read_to_string(dir.join("springsettings.cfg")).unwrap();
        assert_eq!(text, "Fullscreen = 0\nLuaAutoModWidgets = 1\n");
    }

    #[test]
    fn malformed_patch_does_not_create_file() {
        let (_guard, dir) = write_dir();
        let store = FileSettingsStore::in_write_dir(&dir);

        let patch = SettingsPatch {
            defaults: OptionTable::new(),
            overrides: [("Bad=Key", "1")].into_iter().collect(),
        };
        let err = store.apply(&patch).unwrap_err();

        assert!(matches!(err, SettingsStoreError::Invalid(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let (_guard, dir) = write_dir();
        let store = FileSettingsStore::in_write_dir(&dir);
        assert_eq!(store.apply(&SettingsPatch::default()).unwrap(), 0);
        assert!(!store.path().exists());
    }
}
