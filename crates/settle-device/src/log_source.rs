//! State/log accessors
//!
//! A [`LogSource`] returns an ordered sequence of textual records for a set of
//! component tags. Every call reads the log again; nothing is cached.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use settle_core::prelude::*;

use crate::separator::{LogSeparator, SEPARATOR_TAG};

/// Reads records from an external log.
pub trait LogSource {
    /// Fetch the current records for `components`, oldest first.
    fn fetch(&self, components: &[String]) -> Result<Vec<String>>;

    /// Write `separator` into the log stream.
    fn mark(&self, separator: &LogSeparator) -> Result<()>;
}

impl<L: LogSource + ?Sized> LogSource for Box<L> {
    fn fetch(&self, components: &[String]) -> Result<Vec<String>> {
        (**self).fetch(components)
    }

    fn mark(&self, separator: &LogSeparator) -> Result<()> {
        (**self).mark(separator)
    }
}

/// Tag of a `logcat -v brief` record (`I/Tag( 123): msg`) or of a bare
/// `Tag: msg` record. `None` when the line has neither shape.
pub fn record_tag(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let bytes = line.as_bytes();
    if bytes.len() > 2 && bytes[1] == b'/' && bytes[0].is_ascii_alphabetic() {
        let rest = &line[2..];
        let end = rest.find(['(', ':'])?;
        let tag = rest[..end].trim_end();
        return (!tag.is_empty()).then_some(tag);
    }
    let (tag, _) = line.split_once(':')?;
    (!tag.is_empty() && !tag.contains(char::is_whitespace)).then_some(tag)
}

/// Keep records tagged with one of `components`, or a separator record.
///
/// Lines without a recognizable tag fall back to substring matching.
/// An empty component list keeps everything.
pub fn filter_lines(lines: Vec<String>, components: &[String]) -> Vec<String> {
    if components.is_empty() {
        return lines;
    }
    lines
        .into_iter()
        .filter(|line| match record_tag(line) {
            Some(tag) => tag == SEPARATOR_TAG || components.iter().any(|c| c == tag),
            None => {
                line.contains(SEPARATOR_TAG)
                    || components.iter().any(|c| line.contains(c.as_str()))
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Command-backed source
// ─────────────────────────────────────────────────────────────────────────────

/// How component tags reach the log command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterStyle {
    /// Append `<tag>:I` filter specs and a trailing `*:S` (logcat syntax).
    /// No components means no filter specs at all.
    #[default]
    Logcat,
    /// Run the command unchanged and filter its output locally.
    Client,
}

/// Runs an external command and splits its stdout into records.
#[derive(Debug, Clone)]
pub struct CommandLogSource {
    program: String,
    args: Vec<String>,
    filter: FilterStyle,
    mark_args: Option<Vec<String>>,
}

impl CommandLogSource {
    pub fn new(program: impl Into<String>, args: Vec<String>, filter: FilterStyle) -> Self {
        Self {
            program: program.into(),
            args,
            filter,
            mark_args: None,
        }
    }

    /// `adb logcat -v brief -d`, marking with `adb shell log -t`.
    pub fn adb() -> Self {
        Self::new(
            "adb",
            ["logcat", "-v", "brief", "-d"].map(String::from).to_vec(),
            FilterStyle::Logcat,
        )
        .with_mark_args(["shell", "log", "-t"].map(String::from).to_vec())
    }

    /// Arguments for writing a separator; the separator tag and token are
    /// appended.
    pub fn with_mark_args(mut self, mark_args: Vec<String>) -> Self {
        self.mark_args = Some(mark_args);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for a fetch of `components`.
    pub fn fetch_args(&self, components: &[String]) -> Vec<String> {
        let mut args = self.args.clone();
        if self.filter == FilterStyle::Logcat && !components.is_empty() {
            args.push(format!("{SEPARATOR_TAG}:I"));
            args.extend(components.iter().map(|c| format!("{c}:I")));
            args.push("*:S".to_string());
        }
        args
    }

    fn run(&self, args: &[String]) -> Result<String> {
        trace!("Running {} {:?}", self.program, args);
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| Error::process_spawn(&self.program, e.to_string()))?;

        if !output.status.success() {
            warn!(
                "{} exited with {:?}: {}",
                self.program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(Error::process_exit(&self.program, output.status.code()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl LogSource for CommandLogSource {
    fn fetch(&self, components: &[String]) -> Result<Vec<String>> {
        let stdout = self.run(&self.fetch_args(components))?;
        let lines = stdout.lines().map(str::to_string).collect();
        Ok(match self.filter {
            FilterStyle::Logcat => lines,
            FilterStyle::Client => filter_lines(lines, components),
        })
    }

    fn mark(&self, separator: &LogSeparator) -> Result<()> {
        let Some(mark_args) = &self.mark_args else {
            return Err(Error::config(format!(
                "log command '{}' has no way to write separators",
                self.program
            )));
        };
        let mut args = mark_args.clone();
        args.push(SEPARATOR_TAG.to_string());
        args.push(separator.to_string());
        self.run(&args).map(|_| ())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed source
// ─────────────────────────────────────────────────────────────────────────────

/// Re-reads a text file on every fetch.
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSource for FileLogSource {
    fn fetch(&self, components: &[String]) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read log file {}", self.path.display()))?;
        Ok(filter_lines(
            content.lines().map(str::to_string).collect(),
            components,
        ))
    }

    fn mark(&self, separator: &LogSeparator) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", separator.log_line())?;
        Ok(())
    }
}
