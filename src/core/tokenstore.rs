//! Named token sets under `.terraform.d/tokens` and the active credentials file.

use crate::constants;
use crate::core::paths::TerraformPaths;
use crate::util::{fs as tc_fs, path as tc_path};
use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use zeroize::Zeroizing;

#[derive(Debug, Clone)]
pub struct TokenEntry {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
}

/// All stored sets, sorted by name. A missing directory is an empty store.
pub fn list_tokens(tokens_dir: &Path) -> Result<Vec<TokenEntry>> {
    if !tokens_dir.is_dir() {
        return Ok(Vec::new());
    }
    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&tokens_dir.to_string_lossy()),
        constants::TOKEN_EXTENSION
    );
    let mut entries = Vec::new();
    for path in glob::glob(&pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
        let path = path.context("read tokens directory entry")?;
        if !path.is_file() {
            continue;
        }
        let name = match path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(constants::TOKEN_EXTENSION))
        {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let meta = fs::metadata(&path).with_context(|| format!("stat {}", path.display()))?;
        entries.push(TokenEntry {
            name,
            path,
            size_bytes: meta.len(),
            modified: meta.modified().ok(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Token file path for `name`, refusing names that would leave the store.
pub fn token_file(paths: &TerraformPaths, name: &str) -> Result<PathBuf> {
    if let Err(reason) = tc_path::parse_set_name(name) {
        bail!("invalid credentials name '{}': {}", name, reason);
    }
    let path = paths.token_path(name);
    if !tc_path::is_within(&path, &paths.tokens) {
        bail!("invalid credentials name '{}': outside token store", name);
    }
    Ok(path)
}

/// Token file path for an existing set.
pub fn existing_token_file(paths: &TerraformPaths, name: &str) -> Result<PathBuf> {
    let path = token_file(paths, name)?;
    if !path.is_file() {
        bail!("token file for name '{}' not found", name);
    }
    Ok(path)
}

/// Copy the stored set over the active credentials file.
pub fn activate(paths: &TerraformPaths, name: &str) -> Result<()> {
    let src = existing_token_file(paths, name)?;
    let data = read_secret_file(&src)?;
    tc_fs::ensure_dir(&paths.terraform_d, constants::TERRAFORM_D_MODE)?;
    tc_fs::write_atomic(&paths.active, &data, constants::TOKEN_FILE_MODE)
        .with_context(|| format!("activate {}", name))
}

/// Move the active credentials file (fresh from `terraform login`) into the
/// store under `name`, replacing any previous content.
pub fn adopt_active(paths: &TerraformPaths, name: &str) -> Result<()> {
    let dest = token_file(paths, name)?;
    if !paths.active.is_file() {
        bail!("terraform login did not produce {}", paths.active.display());
    }
    let data = read_secret_file(&paths.active)?;
    tc_fs::ensure_dir(&paths.tokens, constants::TOKENS_DIR_MODE)?;
    tc_fs::write_atomic(&dest, &data, constants::TOKEN_FILE_MODE)
        .with_context(|| format!("store {}", name))?;
    fs::remove_file(&paths.active)
        .with_context(|| format!("remove {}", paths.active.display()))?;
    Ok(())
}

pub fn remove(paths: &TerraformPaths, name: &str) -> Result<()> {
    let path = existing_token_file(paths, name)?;
    fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
}

/// SHA-256 of a file's contents, hex encoded.
pub fn fingerprint(path: &Path) -> Result<String> {
    let data = read_secret_file(path)?;
    Ok(format!("{:x}", Sha256::digest(data.as_slice())))
}

/// Fingerprint of the active file, or `None` when it is absent or unreadable.
pub fn active_fingerprint(paths: &TerraformPaths) -> Option<String> {
    if !paths.active.is_file() {
        return None;
    }
    match fingerprint(&paths.active) {
        Ok(fp) => Some(fp),
        Err(e) => {
            eprintln!("warning: {:#}", e);
            None
        }
    }
}

/// Whether `entry` holds the same bytes as the active file. A set that
/// cannot be read counts as inactive.
pub fn is_active(entry: &TokenEntry, active: &str) -> bool {
    match fingerprint(&entry.path) {
        Ok(fp) => fp == active,
        Err(e) => {
            eprintln!("warning: {:#}", e);
            false
        }
    }
}

/// Every stored set whose contents match the active file, sorted by name.
pub fn active_names(paths: &TerraformPaths) -> Result<Vec<String>> {
    let active = match active_fingerprint(paths) {
        Some(fp) => fp,
        None => return Ok(Vec::new()),
    };
    Ok(list_tokens(&paths.tokens)?
        .into_iter()
        .filter(|entry| is_active(entry, &active))
        .map(|entry| entry.name)
        .collect())
}

fn read_secret_file(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Zeroizing::new(data))
}
