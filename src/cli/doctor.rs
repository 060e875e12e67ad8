//! Read-only diagnostics for the local Terraform credentials setup.

use crate::cli::CliContext;
use crate::constants;
use crate::core::tokenstore;
use crate::util::{fs as tc_fs, terraform};
use anyhow::{bail, Result};
use clap::Args;
use std::fs;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Exit with an error when any check fails
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub pass: u32,
    pub warn: u32,
    pub fail: u32,
}

impl Summary {
    fn pass(&mut self, msg: String) {
        println!("  [PASS] {}", msg);
        self.pass += 1;
    }

    fn warn(&mut self, msg: String) {
        println!("  [WARN] {}", msg);
        self.warn += 1;
    }

    fn fail(&mut self, msg: String) {
        println!("  [FAIL] {}", msg);
        self.fail += 1;
    }
}

pub fn run(ctx: &CliContext, args: DoctorArgs) -> Result<()> {
    println!("Doctor: {}", ctx.paths);
    let summary = check(ctx);

    println!();
    println!(
        "Doctor summary: {} pass, {} warn, {} fail",
        summary.pass, summary.warn, summary.fail
    );
    if args.strict && summary.fail > 0 {
        bail!("{} check(s) failed", summary.fail);
    }
    Ok(())
}

pub fn check(ctx: &CliContext) -> Summary {
    let paths = &ctx.paths;
    let mut s = Summary::default();

    match &ctx.settings_warning {
        Some(w) => s.fail(w.clone()),
        None if paths.settings.exists() => {
            s.pass(format!("settings parsed: {}", paths.settings.display()))
        }
        None => {}
    }

    let binary = &ctx.settings.terraform.binary;
    match terraform::version(binary) {
        Some(v) => s.pass(format!("{} available: {}", binary, v)),
        None => s.fail(format!("{} not runnable (create/update need it)", binary)),
    }

    if paths.tokens.is_dir() {
        s.pass(format!("tokens directory exists: {}", paths.tokens.display()));
        check_mode(&mut s, &paths.tokens, constants::TOKENS_DIR_MODE);
        match tokenstore::list_tokens(&paths.tokens) {
            Ok(entries) => {
                s.pass(format!("{} stored credential set(s)", entries.len()));
                for entry in &entries {
                    check_mode(&mut s, &entry.path, constants::TOKEN_FILE_MODE);
                    check_json(&mut s, &entry.path);
                }
            }
            Err(e) => s.fail(format!("cannot list tokens: {:#}", e)),
        }
    } else {
        s.warn(format!(
            "tokens directory missing: {} (run: tcreds create <name>)",
            paths.tokens.display()
        ));
    }

    if paths.active.is_file() {
        s.pass(format!("active credentials: {}", paths.active.display()));
        check_mode(&mut s, &paths.active, constants::TOKEN_FILE_MODE);
        check_json(&mut s, &paths.active);
        match tokenstore::active_names(paths) {
            Ok(names) if names.is_empty() => {
                s.warn("active credentials match no stored set".to_string())
            }
            Ok(names) => s.pass(format!("active credentials match {}", names.join(", "))),
            Err(e) => s.fail(format!("cannot compare active credentials: {:#}", e)),
        }
    } else {
        s.warn(format!("no active credentials: {}", paths.active.display()));
    }

    s
}

fn check_mode(s: &mut Summary, path: &Path, expected: u32) {
    if let Some(mode) = tc_fs::mode_of(path) {
        if mode == expected {
            s.pass(format!("mode ok {:04o}: {}", mode, path.display()));
        } else {
            s.warn(format!(
                "mode {:04o} (expected {:04o}): {}",
                mode,
                expected,
                path.display()
            ));
        }
    }
}

fn check_json(s: &mut Summary, path: &Path) {
    let parsed = fs::read(path)
        .ok()
        .and_then(|data| serde_json::from_slice::<serde_json::Value>(&data).ok());
    match parsed {
        Some(value) if value.get("credentials").is_some() => {}
        Some(_) => s.warn(format!("no \"credentials\" object: {}", path.display())),
        None => s.fail(format!("not valid JSON: {}", path.display())),
    }
}
