//! Centralized constants for layout, permissions, and the terraform binary.

/// Terraform CLI configuration directory, relative to the home directory.
pub const TERRAFORM_D: &str = ".terraform.d";

/// Directory holding named token sets, relative to `TERRAFORM_D`.
pub const TOKENS_DIR: &str = "tokens";

/// The credentials file Terraform actually reads.
pub const ACTIVE_FILE: &str = "credentials.tfrc.json";

/// Settings file for this tool, relative to `TERRAFORM_D`.
pub const SETTINGS_FILE: &str = "tcreds.toml";

/// Append-only audit trail, relative to `TERRAFORM_D`.
pub const AUDIT_LOG_FILE: &str = "tcreds-audit.log";

/// Lock file serializing mutations of the token store.
pub const STORE_LOCK_FILE: &str = "tcreds.lock";

/// File suffix of stored token sets.
pub const TOKEN_EXTENSION: &str = ".tfrc.json";

/// Permission mode for the tokens directory.
pub const TOKENS_DIR_MODE: u32 = 0o700;

/// Permission mode for `.terraform.d` when this tool creates it.
pub const TERRAFORM_D_MODE: u32 = 0o700;

/// Permission mode for token and active credential files.
pub const TOKEN_FILE_MODE: u32 = 0o600;

/// Permission mode for the audit log.
pub const AUDIT_LOG_MODE: u32 = 0o600;

/// Default executable used for `terraform login`.
pub const DEFAULT_TERRAFORM_BIN: &str = "terraform";

/// Timestamp format used in listings.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
