use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::error::RecombineError;
use crate::util::ensure_directory;

/// `<parent>/<name>.lock` for `<parent>/<name>`, whatever trailing separators
/// `tmp_dir` was given with. Paths without a final name (`/`, `.`, `..`)
/// are rejected.
pub fn lock_path(tmp_dir: &Path) -> Result<PathBuf, RecombineError> {
    let name = tmp_dir
        .file_name()
        .ok_or_else(|| RecombineError::InvalidTmpDir(tmp_dir.to_path_buf()))?;
    let mut lock_name = name.to_os_string();
    lock_name.push(".lock");
    Ok(tmp_dir.with_file_name(lock_name))
}

pub fn manifest_path(tmp_dir: &Path) -> PathBuf {
    tmp_dir.join("manifests").join("recombine_run.json")
}

/// Exclusive ownership of the temp directory for one run. The lock file
/// lives beside the directory so clearing the directory leaves it intact.
#[derive(Debug)]
struct WorkspaceLock {
    path: PathBuf,
}

impl WorkspaceLock {
    fn acquire(tmp_dir: &Path) -> Result<Self> {
        let path = lock_path(tmp_dir)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(RecombineError::WorkspaceBusy {
                    tmp_dir: tmp_dir.to_path_buf(),
                    lock_path: path,
                }
                .into());
            }
            Err(source) => return Err(RecombineError::Io { path, source }.into()),
        };
        let lock = Self { path };
        writeln!(file, "{}", std::process::id()).map_err(|source| RecombineError::Io {
            path: lock.path.clone(),
            source,
        })?;

        Ok(lock)
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to release workspace lock");
        }
    }
}

/// The run-scoped temp directory, cleared on acquisition.
#[derive(Debug)]
pub struct Workspace {
    pub root: PathBuf,
    pub extracted: PathBuf,
    pub rotated: PathBuf,
    pub split: PathBuf,
    pub merged: PathBuf,
    pub manifest: PathBuf,
    _lock: WorkspaceLock,
}

impl Workspace {
    pub fn acquire(tmp_dir: &Path) -> Result<Self> {
        let lock = WorkspaceLock::acquire(tmp_dir)?;

        if tmp_dir.is_dir() {
            fs::remove_dir_all(tmp_dir).map_err(|source| RecombineError::Io {
                path: tmp_dir.to_path_buf(),
                source,
            })?;
        }

        let workspace = Self {
            root: tmp_dir.to_path_buf(),
            extracted: tmp_dir.join("extracted"),
            rotated: tmp_dir.join("rotated"),
            split: tmp_dir.join("split"),
            merged: tmp_dir.join("merged"),
            manifest: manifest_path(tmp_dir),
            _lock: lock,
        };

        for dir in [
            &workspace.extracted,
            &workspace.rotated,
            &workspace.split,
            &workspace.merged,
        ] {
            ensure_directory(dir)?;
        }

        info!(tmp_dir = %workspace.root.display(), "prepared workspace");
        Ok(workspace)
    }
}
