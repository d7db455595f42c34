//! Locating the `.phorm/` project directory.
//!
//! The `.phorm/` directory anchors a phorm project: the SQLite database
//! and `config.yaml` live inside it. Discovery probes every ancestor of
//! the starting directory, with a `PHORM_DIR` environment override for
//! scripted use.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Name of the metadata directory holding the database and config.
const PHORM_DIR_NAME: &str = ".phorm";

/// Environment override for the project directory.
const PHORM_DIR_ENV: &str = "PHORM_DIR";

/// Locates the project's `.phorm/` directory.
///
/// `PHORM_DIR` wins when it is set and names an existing directory.
/// Otherwise every ancestor of `start` (canonicalized, so discovery
/// behaves the same from inside symlinked trees) is probed for a `.phorm`
/// entry. A plain file named `.phorm` is ignored and the walk continues
/// upward, so a stray marker file cannot shadow a real project.
pub fn find_phorm_dir(start: &Path) -> Option<PathBuf> {
    if let Some(dir) = env_override() {
        return Some(dir);
    }

    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(PHORM_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

fn env_override() -> Option<PathBuf> {
    let value = env::var(PHORM_DIR_ENV).ok()?;
    let path = PathBuf::from(value);
    path.is_dir().then_some(path)
}

/// Like [`find_phorm_dir`], but a missing project is an error.
///
/// # Errors
///
/// Returns [`ConfigError::PhormDirNotFound`] when no `.phorm/` directory
/// exists on the ancestor chain.
pub fn find_phorm_dir_or_error(start: &Path) -> Result<PathBuf, ConfigError> {
    find_phorm_dir(start).ok_or(ConfigError::PhormDirNotFound)
}

/// Creates the `.phorm/` directory for a new project and returns its
/// location.
///
/// `path` may name either the project root or the `.phorm/` directory
/// itself; missing parents are created. Creation is idempotent.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] when directory creation fails.
pub fn ensure_phorm_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let dir = if path.file_name() == Some(OsStr::new(PHORM_DIR_NAME)) {
        path.to_path_buf()
    } else {
        path.join(PHORM_DIR_NAME)
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
