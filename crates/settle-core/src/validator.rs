//! Retry validation built on the bounded poller
//!
//! A validation function inspects current state and returns `None` when it
//! is valid, or `Some(reason)` describing what is still wrong. The reason from
//! the final attempt is what the caller sees on failure.

use crate::poll::{PollOutcome, PollPolicy, Poller, Sleeper, ThreadSleeper};
use crate::prelude::*;

/// Run `validate` until it reports no mismatch, sleeping with real time.
pub fn validate_with_retry<V>(
    policy: PollPolicy,
    waiting_message: &str,
    validate: V,
) -> Result<()>
where
    V: FnMut() -> Option<String>,
{
    RetryValidator::new(Poller::new(policy)).assert_valid(waiting_message, validate)
}

/// Repeats a validation against fresh state until it passes.
pub struct RetryValidator<Z = ThreadSleeper> {
    poller: Poller<Z>,
}

impl<Z: Sleeper> RetryValidator<Z> {
    pub fn new(poller: Poller<Z>) -> Self {
        Self { poller }
    }

    /// Returns `Error::ValidationFailed` carrying the last mismatch reason
    /// when the retry budget runs out.
    pub fn assert_valid<V>(&self, waiting_message: &str, mut validate: V) -> Result<()>
    where
        V: FnMut() -> Option<String>,
    {
        self.try_assert_valid(waiting_message, || Ok(()), |_| validate())
    }

    /// Validate freshly fetched state; a fetch error aborts immediately.
    pub fn try_assert_valid<S, F, V>(
        &self,
        waiting_message: &str,
        fetch: F,
        mut validate: V,
    ) -> Result<()>
    where
        F: FnMut() -> Result<S>,
        V: FnMut(&S) -> Option<String>,
    {
        let mut last_reason: Option<String> = None;

        let outcome = self.poller.try_find(fetch, |state| match validate(&state) {
            None => Some(()),
            Some(reason) => {
                info!("{}: {}", waiting_message, reason);
                last_reason = Some(reason);
                None
            }
        })?;

        match outcome {
            PollOutcome::Success { .. } => Ok(()),
            PollOutcome::TimedOut { attempts } => Err(Error::validation_failed(
                last_reason.unwrap_or_else(|| format!("not valid after {attempts} attempt(s)")),
            )),
        }
    }
}
