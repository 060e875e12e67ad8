//! Serializable view of a stored credentials set.

use serde::Serialize;

/// One row of `tcreds list`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenSetRow {
    pub name: String,
    pub created: Option<String>,
    pub size_bytes: u64,
    pub active: bool,
}
