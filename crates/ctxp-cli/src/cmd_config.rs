use clap::Subcommand;
use std::io::Write;
use std::path::Path;

use crate::config::{Config, KEYS};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (preamble, clipboard, auto_commit, prompt_timeout_secs, git_timeout_secs)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// Remove a config value (back to default)
    Unset {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, cwd: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(cwd, &key, &value, out),
        ConfigCmd::Get { key } => get(cwd, &key, out),
        ConfigCmd::Unset { key } => unset(cwd, &key, out),
        ConfigCmd::List => list(cwd, out),
    }
}

// ── Command Implementations ──

/// `ctxp config set <key> <value>`
pub fn set(cwd: &Path, key: &str, value: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let path = Config::path(cwd);
    let mut config = Config::read(&path)?;
    config.set(key, value)?;
    config.save(&path)?;
    writeln!(out, "{key} = {value}")?;
    Ok(())
}

/// `ctxp config get <key>`
pub fn get(cwd: &Path, key: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = Config::read(&Config::path(cwd))?;
    match config.get(key)? {
        Some(val) => writeln!(out, "{val}")?,
        None => writeln!(out, "(not set)")?,
    }
    Ok(())
}

/// `ctxp config unset <key>`
pub fn unset(cwd: &Path, key: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let path = Config::path(cwd);
    let mut config = Config::read(&path)?;
    config.unset(key)?;
    if path.exists() {
        config.save(&path)?;
    }
    writeln!(out, "unset {key}")?;
    Ok(())
}

/// `ctxp config list`: file values, before env overrides.
pub fn list(cwd: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = Config::read(&Config::path(cwd))?;
    for key in KEYS {
        let val = config.get(key)?.unwrap_or_else(|| "(not set)".into());
        writeln!(out, "{key} = {val}")?;
    }
    Ok(())
}
