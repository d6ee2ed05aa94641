//! Log separators
//!
//! A separator is a unique token written into the device log before an
//! action, so that later reads only look at records produced after it.

use rand::Rng;

/// Tag under which separators are written to the log.
pub const SEPARATOR_TAG: &str = "LogSeparator";

/// Unique marker written to a log stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogSeparator(String);

impl LogSeparator {
    /// Generate a fresh random token (UUID-shaped, lowercase hex).
    pub fn new() -> Self {
        let bits: u128 = rand::thread_rng().gen();
        let hex = format!("{bits:032x}");
        Self(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }

    /// Wrap an existing token, e.g. one read back from a log.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The record written to the log for this separator.
    pub fn log_line(&self) -> String {
        format!("{SEPARATOR_TAG}: {}", self.0)
    }
}

impl Default for LogSeparator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keep only the records strictly after the first line containing `separator`.
///
/// Without a separator every record is kept. If the separator has not shown
/// up in the log yet, nothing is kept.
pub fn after_separator(lines: Vec<String>, separator: Option<&LogSeparator>) -> Vec<String> {
    let Some(separator) = separator else {
        return lines;
    };

    match lines.iter().position(|l| l.contains(separator.as_str())) {
        Some(idx) => lines.into_iter().skip(idx + 1).collect(),
        None => Vec::new(),
    }
}
