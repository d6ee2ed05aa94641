//! # settle-device - Device Log Access
//!
//! External collaborators for the bounded poller: log sources that read
//! device state, log separators, lifecycle event tallies, and the
//! [`WaitSession`] context object that ties them to a retry policy.
//!
//! Depends on [`settle_core`] for polling, matching and error handling.
//!
//! ## Public API
//!
//! ### Log Sources
//! - [`LogSource`] - Fetch ordered records for a set of component tags
//! - [`CommandLogSource`] - Run a command (`adb logcat -d` by default)
//! - [`FileLogSource`] - Re-read a text file on every fetch
//!
//! ### Separators
//! - [`LogSeparator`] - Unique marker written before an action
//! - [`after_separator()`] - Drop records written before the marker
//!
//! ### Lifecycle Tallies
//! - [`LifecycleCounter`], [`LifecycleTally`] - Count `<tag>: <event>` records
//!
//! ### Sessions
//! - [`WaitSession`] - Per-run context: source, policy, current separator

pub mod lifecycle;
pub mod log_source;
pub mod separator;
pub mod session;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use lifecycle::{LifecycleCounter, LifecycleTally};
pub use log_source::{
    filter_lines, record_tag, CommandLogSource, FileLogSource, FilterStyle, LogSource,
};
pub use separator::{after_separator, LogSeparator, SEPARATOR_TAG};
pub use session::WaitSession;
