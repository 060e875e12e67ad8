//! Thin wrapper over the `terraform` executable.

use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

/// Run `<binary> login [hostname]` with the terminal passed through.
pub fn login(binary: &str, hostname: Option<&str>) -> Result<()> {
    let mut cmd = Command::new(binary);
    cmd.arg("login");
    if let Some(host) = hostname {
        cmd.arg(host);
    }
    let status = cmd
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("run {} login", binary))?;
    if !status.success() {
        bail!("{} login failed ({})", binary, status);
    }
    Ok(())
}

/// First line of `<binary> version`, or `None` if it cannot be run.
pub fn version(binary: &str) -> Option<String> {
    let output = Command::new(binary)
        .arg("version")
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
