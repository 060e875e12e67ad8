//! CLI routing and command dispatch.

use crate::constants;
use crate::core::file_lock::StoreLock;
use crate::core::paths::TerraformPaths;
use crate::core::{audit_log, settings};
use crate::models::settings::SettingsFile;
use crate::util::fs as tc_fs;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod audit;
pub mod credential;
pub mod doctor;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: TerraformPaths,
    pub settings: SettingsFile,
    pub settings_warning: Option<String>,
}

impl CliContext {
    pub fn new(paths: TerraformPaths) -> Self {
        let (settings, settings_warning) = settings::load_or_default(&paths.settings);
        Self {
            paths,
            settings,
            settings_warning,
        }
    }

    /// Take the store lock, creating `.terraform.d` first if needed.
    pub fn lock_store(&self) -> Result<StoreLock> {
        tc_fs::ensure_dir(&self.paths.terraform_d, constants::TERRAFORM_D_MODE)?;
        if let Some(lock) = StoreLock::try_acquire(&self.paths.store_lock)? {
            return Ok(lock);
        }
        eprintln!("waiting for another tcreds process to release the token store...");
        StoreLock::acquire(&self.paths.store_lock)
    }

    /// Append to the audit trail. Failures are reported, never fatal.
    pub fn audit(&self, action: &str, credentials: &str) {
        if !self.settings.audit.enabled {
            return;
        }
        let hostname = self.settings.terraform.hostname.as_deref();
        if let Err(e) = audit_log::log(&self.paths, action, credentials, hostname) {
            eprintln!("warning: audit log failed: {:#}", e);
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "tcreds",
    version,
    about = "Switch between named sets of Terraform CLI credentials",
    override_usage = "tcreds <command> [credentials_name]",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Home directory holding .terraform.d
    #[arg(long, global = true, value_name = "PATH", env = "TCREDS_HOME")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let paths = TerraformPaths::resolve(self.home)?;
        let ctx = CliContext::new(paths);

        // doctor reports this itself
        if let Some(w) = &ctx.settings_warning {
            if !matches!(self.command, Commands::Doctor(_)) {
                eprintln!("warning: {}", w);
            }
        }

        match self.command {
            Commands::Use(args) => credential::run_use(&ctx, args),
            Commands::Create(args) => credential::run_create(&ctx, args),
            Commands::Update(args) => credential::run_update(&ctx, args),
            Commands::Delete(args) => credential::run_delete(&ctx, args),
            Commands::List(args) => credential::run_list(&ctx, args),
            Commands::Current => credential::run_current(&ctx),
            Commands::Doctor(args) => doctor::run(&ctx, args),
            Commands::Audit { command } => audit::run(&ctx, command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Switch to the specified Terraform credentials.
    Use(credential::NameArgs),
    /// Create new Terraform credentials and store them under the provided name.
    Create(credential::NameArgs),
    /// Update the existing Terraform credentials for the specified name.
    Update(credential::NameArgs),
    /// Delete the Terraform credentials associated with the specified name.
    Delete(credential::NameArgs),
    /// List all stored Terraform credentials with their creation date.
    List(credential::ListArgs),
    /// Show which stored credentials are currently active.
    Current,
    /// Diagnose the local Terraform credentials setup (read-only).
    Doctor(doctor::DoctorArgs),
    /// View or verify the audit trail
    Audit {
        #[command(subcommand)]
        command: audit::AuditCommand,
    },
}
