//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Polling Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid poll policy: {message}")]
    InvalidPolicy { message: String },

    #[error("Timed out waiting for {what} after {attempts} attempt(s)")]
    TimedOut { what: String, attempts: u32 },

    #[error("Validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),

    // ─────────────────────────────────────────────────────────────
    // Log Source Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to fetch device state: {message}")]
    Fetch { message: String },

    #[error("Failed to spawn log command '{program}': {reason}")]
    ProcessSpawn { program: String, reason: String },

    #[error("Log command '{program}' exited with code: {code:?}")]
    ProcessExit { program: String, code: Option<i32> },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }

    pub fn timed_out(what: impl Into<String>, attempts: u32) -> Self {
        Self::TimedOut {
            what: what.into(),
            attempts,
        }
    }

    pub fn validation_failed(reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            reason: reason.into(),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    pub fn process_spawn(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProcessSpawn {
            program: program.into(),
            reason: reason.into(),
        }
    }

    pub fn process_exit(program: impl Into<String>, code: Option<i32>) -> Self {
        Self::ProcessExit {
            program: program.into(),
            code,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors describe external state that may still converge;
    /// the caller decides whether to wait again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::TimedOut { .. }
                | Error::ValidationFailed { .. }
                | Error::Fetch { .. }
                | Error::ProcessExit { .. }
        )
    }

    /// Check if this error should abort the run outright
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidPolicy { .. }
                | Error::Pattern(_)
                | Error::ProcessSpawn { .. }
                | Error::ConfigInvalid { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
