//! Configuration types for settle
//!
//! Defines:
//! - `Settings` - Top-level `.settle/config.toml` contents
//! - `PollSettings` - Retry budget and interval
//! - `SourceSettings` - Where log records come from

use serde::{Deserialize, Serialize};
use settle_core::prelude::*;
use settle_core::{PollPolicy, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};
use settle_device::{CommandLogSource, FileLogSource, FilterStyle, LogSource};
use std::path::PathBuf;

/// Global settings from `.settle/config.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub poll: PollSettings,

    #[serde(default)]
    pub source: SourceSettings,
}

/// Retry policy settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollSettings {
    /// Maximum number of fetch/evaluate attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait between attempts in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollSettings {
    pub fn to_policy(&self) -> Result<PollPolicy> {
        PollPolicy::from_millis(self.max_attempts, self.interval_ms)
            .map_err(|e| Error::config_invalid(format!("[poll] {e}")))
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

/// Kind of log source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Command,
    File,
}

/// How component tags are applied for command sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Pass logcat-style `TAG:I` filter specs to the command
    #[default]
    Logcat,
    /// Filter the command output locally
    Client,
}

impl From<FilterMode> for FilterStyle {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Logcat => FilterStyle::Logcat,
            FilterMode::Client => FilterStyle::Client,
        }
    }
}

/// Log source settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub kind: SourceKind,

    /// Program to run for command sources
    #[serde(default = "default_program")]
    pub program: String,

    /// Base arguments for command sources
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    #[serde(default)]
    pub filter: FilterMode,

    /// Arguments for writing a separator (tag and token are appended)
    #[serde(default = "default_mark_args")]
    pub mark_args: Option<Vec<String>>,

    /// Log file for file sources
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            program: default_program(),
            args: default_args(),
            filter: FilterMode::default(),
            mark_args: default_mark_args(),
            path: None,
        }
    }
}

impl SourceSettings {
    /// Build the configured log source.
    pub fn build(&self) -> Result<Box<dyn LogSource>> {
        match self.kind {
            SourceKind::Command => {
                let mut source =
                    CommandLogSource::new(&self.program, self.args.clone(), self.filter.into());
                if let Some(mark_args) = &self.mark_args {
                    source = source.with_mark_args(mark_args.clone());
                }
                Ok(Box::new(source))
            }
            SourceKind::File => {
                let path = self.path.as_ref().ok_or_else(|| {
                    Error::config_invalid("[source] kind = \"file\" requires a path")
                })?;
                Ok(Box::new(FileLogSource::new(path)))
            }
        }
    }
}

fn default_program() -> String {
    "adb".to_string()
}

fn default_args() -> Vec<String> {
    ["logcat", "-v", "brief", "-d"].map(String::from).to_vec()
}

fn default_mark_args() -> Option<Vec<String>> {
    Some(["shell", "log", "-t"].map(String::from).to_vec())
}
