//! Core logic: paths, token store, settings, audit trail, locking.

pub mod audit_log;
pub mod file_lock;
pub mod paths;
pub mod settings;
pub mod tokenstore;
