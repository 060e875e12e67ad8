//! Terraform CLI credentials switcher.
//!
//! Keeps named copies of `~/.terraform.d/credentials.tfrc.json` under
//! `~/.terraform.d/tokens/` and swaps them in on demand. New sets are captured
//! by running `terraform login` and moving its output into the store.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Paths, token store, settings, audit trail, locking
//! - `models` — Data structures
//! - `util` — Filesystem, home lookup, terraform subprocess

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
