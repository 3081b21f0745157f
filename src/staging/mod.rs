//! Durable file staging between pipeline stages.
//!
//! One JSON file per record, named `{source}-{timestamp}.json`. There are no
//! transactional guarantees across files; an interrupted run leaves a partial
//! set, which downstream dedup and the idempotent loader absorb on re-run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("staging I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("staging serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Creates the staging directories when missing.
pub fn ensure_dirs(raw_dir: &Path, processed_dir: &Path) -> Result<(), StagingError> {
    fs::create_dir_all(raw_dir)?;
    fs::create_dir_all(processed_dir)?;
    Ok(())
}

/// Writes one record to `sink` as `{source}-{timestamp}.json`.
///
/// The timestamp carries nanosecond resolution, so sequential writes never
/// collide.
pub fn stage<T: Serialize>(record: &T, source: &str, sink: &Path) -> Result<PathBuf, StagingError> {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S-%f");
    let path = sink.join(format!("{source}-{timestamp}.json"));

    fs::write(&path, serde_json::to_vec(record)?)?;
    log::debug!("Staged record to {}", path.display());

    Ok(path)
}

/// Reads every well-formed `.json` file in a directory. Malformed or
/// unreadable files are logged and skipped.
pub fn load_all(dir: &Path) -> Result<Vec<serde_json::Value>, StagingError> {
    let mut records = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) => {
                log::warn!("Failed to read staged file {}: {error}", path.display());
                continue;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => records.push(value),
            Err(error) => {
                log::warn!("Skipping malformed staged file {}: {error}", path.display());
            }
        }
    }

    Ok(records)
}

/// Removes every file under a directory. Used between pipeline runs.
pub fn clear(dir: &Path) -> Result<usize, StagingError> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(error) => log::warn!("Failed to delete {}: {error}", path.display()),
        }
    }

    log::debug!("Cleared {removed} files from {}", dir.display());
    Ok(removed)
}
