use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Absolute, lexically normalised path: `.` and `..` are folded, symlinks
/// are not resolved and the path does not need to exist.
pub fn absolute_path(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir()?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("working directory is not valid UTF-8: {}", p.display()),
            )
        })?;
        cwd.join(path)
    };

    let mut normalized = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_str()),
        }
    }
    Ok(normalized)
}

/// Writes `contents` to a sibling temp file, syncs it and renames it over
/// `path`, so readers never observe a half-written file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp_path = {
        let mut name = path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    };

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path)?;
        }
        Err(e) => {
            fs::remove_file(&tmp_path).ok();
            return Err(e);
        }
    }

    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn absolute_path_folds_dot_segments() {
        let resolved = absolute_path(Utf8Path::new("/data/./spring/../spring-105")).unwrap();
        assert_eq!(resolved, Utf8PathBuf::from("/data/spring-105"));
    }

    #[test]
    fn replaces_existing_file_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("springsettings.cfg");
        fs::write(&path, "old").unwrap();

        atomic_write(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join("springsettings.cfg.tmp").exists());
    }
}
