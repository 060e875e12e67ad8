//! Credential set names and lexical path containment.

use std::path::{Component, Path, PathBuf};

/// Validate a credential set name. Used as a clap `value_parser`.
pub fn parse_set_name(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("name cannot be empty".into());
    }
    if s.contains("..") {
        return Err("path traversal not allowed".into());
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err("only [a-zA-Z0-9._-] allowed".into());
    }
    Ok(s.to_string())
}

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Whether `path` stays inside `root` once normalized.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize(path).starts_with(normalize(root))
}
