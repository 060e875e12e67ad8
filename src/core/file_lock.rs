//! Advisory flock(2) serializing token store mutations.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// An exclusive store lock. Released when dropped.
pub struct StoreLock {
    _file: File,
}

impl StoreLock {
    /// Block until the lock at `path` is ours.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = open(path)?;
        file.lock_exclusive()
            .with_context(|| format!("acquire lock {}", path.display()))?;
        Ok(Self { _file: file })
    }

    /// `Ok(None)` when another process holds the lock.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            // fs2 on Linux may surface EAGAIN as Other
            Err(ref e) if e.raw_os_error() == Some(11) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("try lock {}", path.display())),
        }
    }
}

fn open(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("open lock file {}", path.display()))
}
