//! Terraform credential path resolution.

use crate::constants;
use crate::util::home;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TerraformPaths {
    pub home: PathBuf,
    pub terraform_d: PathBuf,
    pub tokens: PathBuf,
    pub active: PathBuf,
    pub settings: PathBuf,
    pub audit_log: PathBuf,
    pub store_lock: PathBuf,
}

impl TerraformPaths {
    /// Resolve from the `--home` flag (clap already folds in `TCREDS_HOME`),
    /// falling back to the user's home directory.
    pub fn resolve(home_arg: Option<PathBuf>) -> Result<Self> {
        if let Some(home) = home_arg {
            return Ok(Self::from_home(home));
        }
        Ok(Self::from_home(home::home_dir()?))
    }

    pub fn from_home(home: PathBuf) -> Self {
        let terraform_d = home.join(constants::TERRAFORM_D);
        let tokens = terraform_d.join(constants::TOKENS_DIR);
        let active = terraform_d.join(constants::ACTIVE_FILE);
        let settings = terraform_d.join(constants::SETTINGS_FILE);
        let audit_log = terraform_d.join(constants::AUDIT_LOG_FILE);
        let store_lock = terraform_d.join(constants::STORE_LOCK_FILE);
        Self {
            home,
            terraform_d,
            tokens,
            active,
            settings,
            audit_log,
            store_lock,
        }
    }

    /// Path of the stored token file for `name`.
    pub fn token_path(&self, name: &str) -> PathBuf {
        self.tokens
            .join(format!("{}{}", name, constants::TOKEN_EXTENSION))
    }
}

impl std::fmt::Display for TerraformPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tcreds@{}", self.terraform_d.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_home() {
        let paths = TerraformPaths::from_home(PathBuf::from("/home/u"));
        assert_eq!(paths.terraform_d, PathBuf::from("/home/u/.terraform.d"));
        assert_eq!(paths.tokens, PathBuf::from("/home/u/.terraform.d/tokens"));
        assert_eq!(
            paths.active,
            PathBuf::from("/home/u/.terraform.d/credentials.tfrc.json")
        );
        assert_eq!(paths.settings, PathBuf::from("/home/u/.terraform.d/tcreds.toml"));
        assert_eq!(
            paths.audit_log,
            PathBuf::from("/home/u/.terraform.d/tcreds-audit.log")
        );
        assert_eq!(paths.store_lock, PathBuf::from("/home/u/.terraform.d/tcreds.lock"));
    }

    #[test]
    fn test_token_path() {
        let paths = TerraformPaths::from_home(PathBuf::from("/home/u"));
        assert_eq!(
            paths.token_path("work"),
            PathBuf::from("/home/u/.terraform.d/tokens/work.tfrc.json")
        );
    }

    #[test]
    fn test_resolve_prefers_explicit_home() {
        let paths = TerraformPaths::resolve(Some(PathBuf::from("/tmp/h"))).unwrap();
        assert_eq!(paths.home, PathBuf::from("/tmp/h"));
    }
}
