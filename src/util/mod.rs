//! Utility modules for filesystem, home lookup, and the terraform binary.

pub mod fs;
pub mod home;
pub mod path;
pub mod terraform;
