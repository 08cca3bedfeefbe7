use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR: &str = ".ctxp";
pub const CONFIG_FILE: &str = "config.json";

/// Keys accepted by `ctxp config`, in display order.
pub const KEYS: [&str; 5] = [
    "preamble",
    "clipboard",
    "auto_commit",
    "prompt_timeout_secs",
    "git_timeout_secs",
];

/// Settings from `.ctxp/config.json`, overridden by `CTXP_*` env vars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Explicit preamble path; skips the `CORE_PROMPT.md` search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<PathBuf>,
    /// Use the system clipboard when available.
    pub clipboard: bool,
    /// Commit after an interactive patch without asking.
    pub auto_commit: bool,
    /// Give up on an interactive prompt after this long. Unset blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_timeout_secs: Option<u64>,
    /// Kill a git step after this long. Unset blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preamble: None,
            clipboard: true,
            auto_commit: false,
            prompt_timeout_secs: None,
            git_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn path(cwd: &Path) -> PathBuf {
        cwd.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load config for `cwd` and apply environment overrides.
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let mut config = Self::read(&Self::path(cwd))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// The file's settings alone. A missing file means defaults.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        ctxp_store::write_atomic(path, format!("{json}\n").as_bytes())
    }

    /// Parse `value` into the field named `key`.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "preamble" => self.preamble = Some(PathBuf::from(value)),
            "clipboard" => self.clipboard = parse_flag(key, value)?,
            "auto_commit" => self.auto_commit = parse_flag(key, value)?,
            "prompt_timeout_secs" => self.prompt_timeout_secs = Some(parse_secs(key, value)?),
            "git_timeout_secs" => self.git_timeout_secs = Some(parse_secs(key, value)?),
            _ => anyhow::bail!("unknown config key: {key} (expected one of {})", KEYS.join(", ")),
        }
        Ok(())
    }

    /// Current value of `key`, `None` when an optional field is unset.
    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(match key {
            "preamble" => self.preamble.as_ref().map(|p| p.display().to_string()),
            "clipboard" => Some(self.clipboard.to_string()),
            "auto_commit" => Some(self.auto_commit.to_string()),
            "prompt_timeout_secs" => self.prompt_timeout_secs.map(|s| s.to_string()),
            "git_timeout_secs" => self.git_timeout_secs.map(|s| s.to_string()),
            _ => anyhow::bail!("unknown config key: {key}"),
        })
    }

    /// Put `key` back to its default.
    pub fn unset(&mut self, key: &str) -> anyhow::Result<()> {
        let defaults = Self::default();
        match key {
            "preamble" => self.preamble = defaults.preamble,
            "clipboard" => self.clipboard = defaults.clipboard,
            "auto_commit" => self.auto_commit = defaults.auto_commit,
            "prompt_timeout_secs" => self.prompt_timeout_secs = defaults.prompt_timeout_secs,
            "git_timeout_secs" => self.git_timeout_secs = defaults.git_timeout_secs,
            _ => anyhow::bail!("unknown config key: {key}"),
        }
        Ok(())
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(p) = var("CTXP_PREAMBLE").filter(|v| !v.is_empty()) {
            self.preamble = Some(PathBuf::from(p));
        }
        if var("CTXP_NO_CLIPBOARD").is_some_and(|v| !v.is_empty() && v != "0") {
            self.clipboard = false;
        }
        if let Some(secs) = var("CTXP_PROMPT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.prompt_timeout_secs = Some(secs);
        }
        if let Some(secs) = var("CTXP_GIT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.git_timeout_secs = Some(secs);
        }
    }

    pub fn prompt_timeout(&self) -> Option<Duration> {
        self.prompt_timeout_secs.map(Duration::from_secs)
    }

    pub fn git_timeout(&self) -> Option<Duration> {
        self.git_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_flag(key: &str, value: &str) -> anyhow::Result<bool> {
    value
        .parse()
        .with_context(|| format!("{key} takes true or false, got {value:?}"))
}

fn parse_secs(key: &str, value: &str) -> anyhow::Result<u64> {
    value
        .parse()
        .with_context(|| format!("{key} takes a whole number of seconds, got {value:?}"))
}
