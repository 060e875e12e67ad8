//! Loading `tcreds.toml` with environment overrides.

use crate::models::settings::SettingsFile;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::Path;

/// Environment override for `[terraform] binary`.
pub const TERRAFORM_BIN_ENV: &str = "TCREDS_TERRAFORM_BIN";

pub fn load(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("read settings {}", path.display()))?;
    let settings: SettingsFile = toml::from_str(&content)
        .with_context(|| format!("parse settings {}", path.display()))?;
    Ok(settings)
}

/// Load settings, downgrading a bad file to defaults plus a warning.
pub fn load_or_default(path: &Path) -> (SettingsFile, Option<String>) {
    let (mut settings, warning) = match load(path) {
        Ok(s) => (s, None),
        Err(e) => (
            SettingsFile::default(),
            Some(format!("cannot load settings: {:#}", e)),
        ),
    };
    apply_env(&mut settings);
    (settings, warning)
}

fn apply_env(settings: &mut SettingsFile) {
    if let Ok(bin) = env::var(TERRAFORM_BIN_ENV) {
        if !bin.trim().is_empty() {
            settings.terraform.binary = bin;
        }
    }
}
