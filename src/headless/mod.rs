//! Headless output - JSON events for scripts
//!
//! With `--json`, settle writes structured events to stdout instead of plain
//! text, so CI scripts can follow a wait without scraping human output.
//!
//! # Event Format
//!
//! Events are output as NDJSON (newline-delimited JSON), one event per line.
//! Each event has an "event" field indicating its type, along with event-specific data.
//!
//! # Example Output
//!
//! ```json
//! {"event":"wait_started","pattern":".*onResume","components":["TestActivity"],"max_attempts":5,"interval_ms":1000,"timestamp":1704700001000}
//! {"event":"attempt_failed","attempt":1,"max_attempts":5,"records":3,"timestamp":1704700001010}
//! {"event":"matched","attempt":2,"line":"TestActivity: onResume","captures":null,"timestamp":1704700002020}
//! ```

pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

/// Events emitted while waiting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// A wait began
    WaitStarted {
        pattern: String,
        components: Vec<String>,
        max_attempts: u32,
        interval_ms: u64,
        timestamp: i64,
    },

    /// A separator was written to the log
    SeparatorWritten { separator: String, timestamp: i64 },

    /// A fetched snapshot did not satisfy the pattern
    AttemptFailed {
        attempt: u32,
        max_attempts: u32,
        records: usize,
        timestamp: i64,
    },

    /// The pattern matched
    Matched {
        attempt: u32,
        line: Option<String>,
        captures: Option<Vec<String>>,
        timestamp: i64,
    },

    /// The retry budget ran out
    TimedOut { attempts: u32, timestamp: i64 },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn wait_started(
        pattern: &str,
        components: &[String],
        max_attempts: u32,
        interval_ms: u64,
    ) -> Self {
        Self::WaitStarted {
            pattern: pattern.to_string(),
            components: components.to_vec(),
            max_attempts,
            interval_ms,
            timestamp: Self::now(),
        }
    }

    pub fn separator_written(separator: &str) -> Self {
        Self::SeparatorWritten {
            separator: separator.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn attempt_failed(attempt: u32, max_attempts: u32, records: usize) -> Self {
        Self::AttemptFailed {
            attempt,
            max_attempts,
            records,
            timestamp: Self::now(),
        }
    }

    pub fn matched(attempt: u32, line: Option<String>, captures: Option<Vec<String>>) -> Self {
        Self::Matched {
            attempt,
            line,
            captures,
            timestamp: Self::now(),
        }
    }

    pub fn timed_out(attempts: u32) -> Self {
        Self::TimedOut {
            attempts,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}
