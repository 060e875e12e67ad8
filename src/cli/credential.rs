//! Handlers for the credential set commands.

use crate::cli::CliContext;
use crate::constants;
use crate::core::tokenstore;
use crate::models::token::TokenSetRow;
use crate::util::{fs as tc_fs, path as tc_path, terraform};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Credentials name
    #[arg(value_parser = tc_path::parse_set_name)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

fn require_name(name: Option<String>) -> Result<String> {
    match name {
        Some(name) => Ok(name),
        None => bail!("no credentials name provided"),
    }
}

pub fn run_use(ctx: &CliContext, args: NameArgs) -> Result<()> {
    let name = require_name(args.name)?;
    let _lock = ctx.lock_store()?;
    tokenstore::activate(&ctx.paths, &name)?;
    ctx.audit("use", &name);

    println!("Switched Terraform credentials to: {}", name);
    Ok(())
}

pub fn run_create(ctx: &CliContext, args: NameArgs) -> Result<()> {
    let name = require_name(args.name)?;
    let token = tokenstore::token_file(&ctx.paths, &name)?;
    tc_fs::ensure_dir(&ctx.paths.tokens, constants::TOKENS_DIR_MODE)?;
    if token.exists() {
        eprintln!("warning: '{}' already exists and will be replaced", name);
    }

    login(ctx)?;

    let _lock = ctx.lock_store()?;
    tokenstore::adopt_active(&ctx.paths, &name)?;
    ctx.audit("create", &name);

    println!("Stored Terraform credentials as: {}", name);
    Ok(())
}

pub fn run_update(ctx: &CliContext, args: NameArgs) -> Result<()> {
    let name = require_name(args.name)?;
    tokenstore::existing_token_file(&ctx.paths, &name)?;

    login(ctx)?;

    let _lock = ctx.lock_store()?;
    tokenstore::adopt_active(&ctx.paths, &name)?;
    ctx.audit("update", &name);

    println!("Updated Terraform credentials: {}", name);
    Ok(())
}

pub fn run_delete(ctx: &CliContext, args: NameArgs) -> Result<()> {
    let name = require_name(args.name)?;
    let _lock = ctx.lock_store()?;
    tokenstore::remove(&ctx.paths, &name)?;
    ctx.audit("delete", &name);

    println!("Deleted Terraform credentials: {}", name);
    Ok(())
}

pub fn run_list(ctx: &CliContext, args: ListArgs) -> Result<()> {
    println!("{}", list_output(ctx, &args.format)?);
    Ok(())
}

fn list_output(ctx: &CliContext, format: &str) -> Result<String> {
    if format != "table" && format != "json" {
        bail!("invalid format: {} (use table|json)", format);
    }

    let rows = collect_rows(ctx)?;

    if format == "json" {
        return serde_json::to_string_pretty(&rows).context("serialize list");
    }
    if rows.is_empty() {
        return Ok("No credentials found".to_string());
    }
    Ok(render_table(rows).to_string())
}

pub fn run_current(ctx: &CliContext) -> Result<()> {
    println!("{}", current_output(ctx)?);
    Ok(())
}

/// Sets with identical contents are indistinguishable, so all of them are named.
fn current_output(ctx: &CliContext) -> Result<String> {
    if !ctx.paths.active.is_file() {
        return Ok(format!(
            "No active credentials ({} does not exist)",
            ctx.paths.active.display()
        ));
    }
    let names = tokenstore::active_names(&ctx.paths)?;
    if names.is_empty() {
        return Ok("Active credentials do not match any stored set".to_string());
    }
    Ok(names.join("\n"))
}

fn login(ctx: &CliContext) -> Result<()> {
    let tf = &ctx.settings.terraform;
    terraform::login(&tf.binary, tf.hostname.as_deref())
}

fn collect_rows(ctx: &CliContext) -> Result<Vec<TokenSetRow>> {
    let active = tokenstore::active_fingerprint(&ctx.paths);
    let rows = tokenstore::list_tokens(&ctx.paths.tokens)?
        .into_iter()
        .map(|entry| TokenSetRow {
            active: active
                .as_deref()
                .is_some_and(|fp| tokenstore::is_active(&entry, fp)),
            created: entry.modified.map(|t| {
                let dt: DateTime<Local> = t.into();
                dt.format(constants::DATE_FORMAT).to_string()
            }),
            size_bytes: entry.size_bytes,
            name: entry.name,
        })
        .collect();
    Ok(rows)
}

fn render_table(rows: Vec<TokenSetRow>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("NAME").add_attribute(Attribute::Bold),
        Cell::new("DATE CREATED").add_attribute(Attribute::Bold),
        Cell::new("ACTIVE").add_attribute(Attribute::Bold),
    ]);
    for row in rows {
        table.add_row(vec![
            row.name,
            row.created.unwrap_or_else(|| "-".to_string()),
            if row.active { "*".to_string() } else { String::new() },
        ]);
    }
    table
}
