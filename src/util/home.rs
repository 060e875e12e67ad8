//! Home directory lookup.

use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

/// `$HOME` when set and non-empty, else the passwd entry of the effective uid.
pub fn home_dir() -> Result<PathBuf> {
    if let Some(home) = env::var_os("HOME").filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    passwd_home()
}

fn passwd_home() -> Result<PathBuf> {
    let uid = nix::unistd::geteuid();
    match nix::unistd::User::from_uid(uid) {
        Ok(Some(user)) => Ok(user.dir),
        Ok(None) => bail!("cannot determine home directory: no passwd entry for uid {}", uid),
        Err(e) => bail!("cannot determine home directory: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passwd_home_does_not_panic() {
        // Containers may lack a passwd entry; only the absence of a panic matters.
        let _ = passwd_home();
    }
}
