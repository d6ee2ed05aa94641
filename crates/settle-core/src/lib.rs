//! # settle-core - Bounded Polling Primitives
//!
//! Foundation crate for settle. Provides the bounded poller used to await
//! eventually-consistent external state, retry validation, whole-line pattern
//! matching, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Polling (`poll`)
//! - [`PollPolicy`] - Fixed retry budget and interval
//! - [`Poller`] - Fetch/evaluate/sleep loop with an injectable [`Sleeper`]
//! - [`PollOutcome`] - `Success` or `TimedOut`, with the number of fetches
//! - [`poll_until()`], [`try_poll_until()`], [`poll_find()`] - Real-time helpers
//! - `RecordingSleeper` - Non-blocking sleeper for tests (`test-helpers` feature)
//!
//! ### Validation (`validator`)
//! - [`RetryValidator`] - Retry a `None`/`Some(reason)` validation
//! - [`validate_with_retry()`] - Convenience wrapper with real sleeping
//!
//! ### Matching (`matcher`)
//! - [`LinePattern`] - Regex that must match a whole trimmed line
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! ```rust
//! use settle_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod matcher;
pub mod poll;
pub mod prelude;
pub mod validator;

pub use error::{Error, Result, ResultExt};
pub use matcher::LinePattern;
pub use poll::{
    poll_find, poll_until, try_poll_until, PollOutcome, PollPolicy, Poller, Sleeper,
    ThreadSleeper, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS,
};

#[cfg(any(test, feature = "test-helpers"))]
pub use poll::RecordingSleeper;
pub use validator::{validate_with_retry, RetryValidator};
