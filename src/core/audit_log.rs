//! Append-only, hash-chained audit trail of token store changes.
//!
//! Each line is a JSON object. `entry_hash` is the SHA-256 of the entry's
//! canonical JSON (sorted keys, `entry_hash` omitted) and `prev_hash` links to
//! the previous line's `entry_hash`. Token contents are never recorded.

use crate::constants;
use crate::core::file_lock::StoreLock;
use crate::core::paths::TerraformPaths;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub credentials: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_hash: Option<String>,
}

fn detect_actor() -> String {
    if let Ok(user) = std::env::var("SUDO_USER") {
        if !user.is_empty() {
            return format!("{}(sudo)", user);
        }
    }
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

/// Record an action by the current user.
pub fn log(
    paths: &TerraformPaths,
    action: &str,
    credentials: &str,
    hostname: Option<&str>,
) -> Result<()> {
    log_action(paths, action, credentials, hostname, &detect_actor())
}

pub fn log_action(
    paths: &TerraformPaths,
    action: &str,
    credentials: &str,
    hostname: Option<&str>,
    actor: &str,
) -> Result<()> {
    crate::util::fs::ensure_dir(&paths.terraform_d, constants::TERRAFORM_D_MODE)?;
    let _lock = StoreLock::acquire(&audit_lock_path(paths))?;
    let prev_hash = last_entry_hash(&paths.audit_log)?;

    let mut entry = AuditEntry {
        timestamp: Utc::now(),
        action: action.to_string(),
        actor: actor.to_string(),
        credentials: credentials.to_string(),
        hostname: hostname.map(str::to_string),
        prev_hash,
        entry_hash: None,
    };
    entry.entry_hash = Some(compute_entry_hash(&entry)?);

    let line = serde_json::to_string(&entry).context("serialize audit entry")?;
    append_line(&paths.audit_log, &line)
}

/// The audit trail has its own lock so logging never contends with a
/// command that already holds the store lock.
fn audit_lock_path(paths: &TerraformPaths) -> std::path::PathBuf {
    paths.audit_log.with_extension("lock")
}

fn compute_entry_hash(entry: &AuditEntry) -> Result<String> {
    let mut value = serde_json::to_value(entry).context("serialize for hash")?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("entry_hash");
    }
    let canonical = canonicalize_value(&value);
    let canonical_str = serde_json::to_string(&canonical).context("serialize canonical json")?;
    Ok(format!("{:064x}", Sha256::digest(canonical_str.as_bytes())))
}

/// Recursively sort object keys.
fn canonicalize_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize_value(&map[k]));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(canonicalize_value).collect())
        }
        other => other.clone(),
    }
}

fn append_line(audit_path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_path)
        .with_context(|| format!("open audit log {}", audit_path.display()))?;
    writeln!(file, "{}", line).context("write audit entry")?;
    crate::util::fs::set_permissions(audit_path, constants::AUDIT_LOG_MODE)
}

fn last_entry_hash(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let last = match content.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => line,
        None => return Ok(None),
    };
    if let Ok(entry) = serde_json::from_str::<AuditEntry>(last) {
        if let Some(hash) = entry.entry_hash {
            return Ok(Some(hash));
        }
    }
    // Unparseable tail: chain onto the raw line instead.
    Ok(Some(format!("{:064x}", Sha256::digest(last.as_bytes()))))
}

/// Read entries, keeping only the newest `limit` when given.
pub fn read_log(paths: &TerraformPaths, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
    if !paths.audit_log.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    let mut entries = Vec::new();
    let mut malformed = 0usize;

    for line in BufReader::new(file).lines() {
        let line = line.context("read audit log line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(_) => malformed += 1,
        }
    }

    if malformed > 0 {
        eprintln!("warning: {} malformed audit entries skipped", malformed);
    }

    if let Some(limit) = limit {
        if entries.len() > limit {
            entries = entries.split_off(entries.len() - limit);
        }
    }
    Ok(entries)
}

/// Check the hash chain over every non-empty line. Returns (lines checked,
/// problems found). A line that is not an entry counts as a problem, and its
/// raw hash is what the next entry must link to.
pub fn verify_chain(paths: &TerraformPaths) -> Result<(usize, Vec<String>)> {
    if !paths.audit_log.exists() {
        return Ok((0, Vec::new()));
    }
    let file = fs::File::open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    let mut errors = Vec::new();
    let mut prev: Option<String> = None;
    let mut total = 0usize;

    for line in BufReader::new(file).lines() {
        let line = line.context("read audit log line")?;
        if line.trim().is_empty() {
            continue;
        }
        total += 1;
        let n = total;

        let entry = match serde_json::from_str::<AuditEntry>(&line) {
            Ok(entry) => entry,
            Err(e) => {
                errors.push(format!("entry {}: not an audit entry ({})", n, e));
                prev = Some(format!("{:064x}", Sha256::digest(line.as_bytes())));
                continue;
            }
        };

        if n > 1 && entry.prev_hash != prev {
            errors.push(format!(
                "entry {}: prev_hash mismatch (expected {:?}, got {:?})",
                n, prev, entry.prev_hash
            ));
        }
        match &entry.entry_hash {
            Some(stored) => {
                if &compute_entry_hash(&entry)? != stored {
                    errors.push(format!("entry {}: entry_hash mismatch (tampered?)", n));
                }
            }
            None => errors.push(format!("entry {}: missing entry_hash", n)),
        }
        prev = Some(
            entry
                .entry_hash
                .unwrap_or_else(|| format!("{:064x}", Sha256::digest(line.as_bytes()))),
        );
    }

    Ok((total, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, TerraformPaths) {
        let dir = TempDir::new().unwrap();
        let paths = TerraformPaths::from_home(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn test_log_and_read() {
        let (_dir, paths) = test_paths();
        log_action(&paths, "create", "work", Some("app.terraform.io"), "tester").unwrap();
        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "create");
        assert_eq!(entries[0].credentials, "work");
        assert_eq!(entries[0].hostname.as_deref(), Some("app.terraform.io"));
        assert!(entries[0].prev_hash.is_none());
        assert!(entries[0].entry_hash.is_some());
    }

    #[test]
    fn test_entries_are_chained() {
        let (_dir, paths) = test_paths();
        log_action(&paths, "create", "work", None, "tester").unwrap();
        log_action(&paths, "use", "work", None, "tester").unwrap();
        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries[1].prev_hash, entries[0].entry_hash);
    }

    #[test]
    fn test_read_log_with_limit() {
        let (_dir, paths) = test_paths();
        for name in ["a", "b", "c", "d"] {
            log_action(&paths, "use", name, None, "tester").unwrap();
        }
        let entries = read_log(&paths, Some(2)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].credentials, "d");
    }

    #[test]
    fn test_read_log_nonexistent() {
        let (_dir, paths) = test_paths();
        assert!(read_log(&paths, None).unwrap().is_empty());
    }

    #[test]
    fn test_canonical_json_deterministic() {
        let c1 = canonicalize_value(&serde_json::json!({"b": 1, "a": {"d": 1, "c": 2}}));
        let c2 = canonicalize_value(&serde_json::json!({"a": {"c": 2, "d": 1}, "b": 1}));
        let s1 = serde_json::to_string(&c1).unwrap();
        assert_eq!(s1, serde_json::to_string(&c2).unwrap());
        assert_eq!(s1, r#"{"a":{"c":2,"d":1},"b":1}"#);
    }

    #[test]
    fn test_verify_chain_ok() {
        let (_dir, paths) = test_paths();
        log_action(&paths, "create", "work", None, "tester").unwrap();
        log_action(&paths, "use", "work", None, "tester").unwrap();
        log_action(&paths, "delete", "work", None, "tester").unwrap();
        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 3);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_verify_chain_detects_tamper() {
        let (_dir, paths) = test_paths();
        log_action(&paths, "create", "work", None, "tester").unwrap();
        log_action(&paths, "delete", "work", None, "tester").unwrap();

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        fs::write(&paths.audit_log, content.replace("delete", "update")).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_verify_chain_detects_removed_entry() {
        let (_dir, paths) = test_paths();
        for name in ["a", "b", "c"] {
            log_action(&paths, "use", name, None, "tester").unwrap();
        }
        let content = fs::read_to_string(&paths.audit_log).unwrap();
        let kept: Vec<_> = content.lines().enumerate().filter(|(i, _)| *i != 1).map(|(_, l)| l).collect();
        fs::write(&paths.audit_log, kept.join("\n") + "\n").unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("prev_hash mismatch"));
    }

    #[test]
    fn test_verify_chain_detects_replaced_tail() {
        let (_dir, paths) = test_paths();
        log_action(&paths, "create", "work", None, "tester").unwrap();
        log_action(&paths, "use", "work", None, "tester").unwrap();

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        let first = content.lines().next().unwrap();
        fs::write(&paths.audit_log, format!("{}\n{{\"tampered\":true}}\n", first)).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("entry 2: not an audit entry"));
    }

    #[test]
    fn test_verify_chain_links_past_malformed_line() {
        let (_dir, paths) = test_paths();
        log_action(&paths, "create", "work", None, "tester").unwrap();
        append_line(&paths.audit_log, "garbage").unwrap();
        // The next entry chains onto the raw hash of the bad line.
        log_action(&paths, "use", "work", None, "tester").unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 3);
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert!(errors[0].starts_with("entry 2:"));
    }

    #[test]
    fn test_verify_chain_empty_log() {
        let (_dir, paths) = test_paths();
        assert_eq!(verify_chain(&paths).unwrap(), (0, Vec::new()));
    }
}
