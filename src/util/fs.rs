use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub fn ensure_dir(path: &Path, mode: u32) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("create directory {}", path.display()))?;
        set_permissions(path, mode)?;
    }
    Ok(())
}

pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(mode);
        fs::set_permissions(path, perm)
            .with_context(|| format!("set permissions {:o} on {}", mode, path.display()))?;
    }
    Ok(())
}

/// Current permission bits of `path`, or `None` off unix or when unreadable.
pub fn mode_of(path: &Path) -> Option<u32> {
    #[cfg(unix)]
    {
        fs::metadata(path)
            .ok()
            .map(|meta| meta.permissions().mode() & 0o777)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

/// Replace `dest` with `data` through a temp file in the same directory.
/// Permissions are applied before the rename, so the file is never visible
/// with a wider mode.
pub fn write_atomic(dest: &Path, data: &[u8], mode: u32) -> Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".tcreds-")
        .tempfile_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(data)
        .with_context(|| format!("write temp file for {}", dest.display()))?;
    tmp.flush().context("flush temp file")?;

    #[cfg(unix)]
    {
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .with_context(|| format!("set permissions {:o} on temp file", mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(dest)
        .map_err(|err| anyhow::anyhow!("persist {}: {}", dest.display(), err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        ensure_dir(&nested, 0o700).unwrap();
        assert!(nested.is_dir());
        #[cfg(unix)]
        assert_eq!(mode_of(&nested), Some(0o700));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("creds.json");
        fs::write(&dest, b"old").unwrap();
        write_atomic(&dest, b"new", 0o600).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
        #[cfg(unix)]
        assert_eq!(mode_of(&dest), Some(0o600));
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("creds.json");
        write_atomic(&dest, b"{}", 0o600).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }
}
