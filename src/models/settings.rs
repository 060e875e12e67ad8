//! `tcreds.toml` settings file model.

use crate::constants;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub terraform: TerraformSection,
    #[serde(default)]
    pub audit: AuditSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformSection {
    /// Executable used for `login`.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Hostname passed to `terraform login` (its default host when unset).
    #[serde(default)]
    pub hostname: Option<String>,
}

impl Default for TerraformSection {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            hostname: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_binary() -> String {
    constants::DEFAULT_TERRAFORM_BIN.to_string()
}

fn default_true() -> bool {
    true
}
