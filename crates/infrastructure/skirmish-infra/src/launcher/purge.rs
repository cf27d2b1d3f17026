use camino::{Utf8Path, Utf8PathBuf};
use skirmish_config::{purge_backoff, PURGE_MAX_RETRIES};
use std::io;
use tracing::{debug, error, info, warn};

/// Removes the directory that should have contained `engine_path` so the
/// next start reinstalls the engine. Failures are logged, never returned.
pub async fn purge_engine_dir(engine_path: &Utf8Path) {
    let Some(engine_dir) = engine_dir_of(engine_path) else {
        warn!("Not deleting engine directory for {engine_path}: no usable parent directory");
        return;
    };

    info!("Deleting the engine directory {engine_dir} to retry on next run.");
    if let Err(err) = remove_dir_with_retries(&engine_dir, PURGE_MAX_RETRIES).await {
        error!("Failed to remove engine directory: {err}");
    }
}

fn engine_dir_of(engine_path: &Utf8Path) -> Option<Utf8PathBuf> {
    let parent = engine_path.parent()?;
    // Never the filesystem root, never the (implicit) working directory.
    if parent.as_str().is_empty() || parent.parent().is_none() {
        return None;
    }
    Some(parent.to_path_buf())
}

/// `rm -rf` with linear back-off. A directory that is already gone counts as
/// removed.
pub async fn remove_dir_with_retries(dir: &Utf8Path, max_retries: u32) -> io::Result<()> {
    let mut attempt = 0;
    loop {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                debug!("Removing {dir} failed ({e}), retry {attempt}/{max_retries}");
                tokio::time::sleep(purge_backoff(attempt)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
