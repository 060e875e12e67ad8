//! `audit` subcommands: browse and check the trail of token store changes.

use crate::cli::CliContext;
use crate::constants;
use crate::core::audit_log::{self, AuditEntry};
use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Show recent changes, newest last
    Log(AuditLogArgs),
    /// Check that the trail has not been edited
    Verify,
}

#[derive(Args, Debug)]
pub struct AuditLogArgs {
    /// Only changes to this credentials set
    #[arg(long)]
    pub name: Option<String>,

    /// Only this action (use|create|update|delete)
    #[arg(long)]
    pub action: Option<String>,

    /// Maximum number of entries to show
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

pub fn run(ctx: &CliContext, cmd: AuditCommand) -> Result<()> {
    let out = match cmd {
        AuditCommand::Log(args) => log_output(ctx, &args)?,
        AuditCommand::Verify => verify_output(ctx)?,
    };
    println!("{}", out);
    Ok(())
}

fn log_output(ctx: &CliContext, args: &AuditLogArgs) -> Result<String> {
    let mut entries: Vec<AuditEntry> = audit_log::read_log(&ctx.paths, None)?
        .into_iter()
        .filter(|e| args.name.as_deref().map_or(true, |n| e.credentials == n))
        .filter(|e| args.action.as_deref().map_or(true, |a| e.action == a))
        .collect();
    if entries.len() > args.limit {
        entries = entries.split_off(entries.len() - args.limit);
    }

    if entries.is_empty() {
        return Ok("No audit entries found.".to_string());
    }
    Ok(entries_table(entries).to_string())
}

fn entries_table(entries: Vec<AuditEntry>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(
        ["WHEN", "ACTION", "NAME", "HOST", "BY"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );
    for e in entries {
        let when: DateTime<Local> = e.timestamp.into();
        table.add_row(vec![
            when.format(constants::DATE_FORMAT).to_string(),
            e.action,
            e.credentials,
            e.hostname.unwrap_or_else(|| "-".to_string()),
            e.actor,
        ]);
    }
    table
}

fn verify_output(ctx: &CliContext) -> Result<String> {
    let (total, errors) = audit_log::verify_chain(&ctx.paths)?;
    if !errors.is_empty() {
        bail!(
            "audit trail {} is broken:\n  {}",
            ctx.paths.audit_log.display(),
            errors.join("\n  ")
        );
    }
    Ok(format!("Audit trail intact ({} entries)", total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::TerraformPaths;
    use std::fs;
    use tempfile::TempDir;

    fn test_ctx() -> (TempDir, CliContext) {
        let dir = TempDir::new().unwrap();
        let ctx = CliContext::new(TerraformPaths::from_home(dir.path().to_path_buf()));
        (dir, ctx)
    }

    fn log_args(name: Option<&str>, action: Option<&str>, limit: usize) -> AuditLogArgs {
        AuditLogArgs {
            name: name.map(str::to_string),
            action: action.map(str::to_string),
            limit,
        }
    }

    fn seed(ctx: &CliContext) {
        for (action, name) in [("create", "work"), ("create", "personal"), ("use", "work")] {
            audit_log::log_action(&ctx.paths, action, name, None, "tester").unwrap();
        }
    }

    #[test]
    fn test_log_empty() {
        let (_dir, ctx) = test_ctx();
        assert_eq!(
            log_output(&ctx, &log_args(None, None, 50)).unwrap(),
            "No audit entries found."
        );
    }

    #[test]
    fn test_log_filters_by_name_and_action() {
        let (_dir, ctx) = test_ctx();
        seed(&ctx);

        let out = log_output(&ctx, &log_args(Some("personal"), None, 50)).unwrap();
        assert!(out.contains("personal"));
        assert!(!out.contains("work"));

        let out = log_output(&ctx, &log_args(Some("work"), Some("use"), 50)).unwrap();
        assert!(out.contains("use"));
        assert!(!out.contains("create"));

        let out = log_output(&ctx, &log_args(Some("ghost"), None, 50)).unwrap();
        assert_eq!(out, "No audit entries found.");
    }

    #[test]
    fn test_log_limit_keeps_newest() {
        let (_dir, ctx) = test_ctx();
        seed(&ctx);
        let out = log_output(&ctx, &log_args(None, Some("create"), 1)).unwrap();
        assert!(out.contains("personal"));
        assert!(!out.contains("work"));
    }

    #[test]
    fn test_verify_intact() {
        let (_dir, ctx) = test_ctx();
        seed(&ctx);
        assert_eq!(verify_output(&ctx).unwrap(), "Audit trail intact (3 entries)");
    }

    #[test]
    fn test_verify_fails_on_broken_chain() {
        let (_dir, ctx) = test_ctx();
        seed(&ctx);
        let content = fs::read_to_string(&ctx.paths.audit_log).unwrap();
        fs::write(&ctx.paths.audit_log, content.replace("personal", "staging")).unwrap();

        let err = run(&ctx, AuditCommand::Verify).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("is broken"));
        assert!(msg.contains("entry 2: entry_hash mismatch"));
    }
}
