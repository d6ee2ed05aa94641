//! Bounded poller for eventually-consistent external state
//!
//! A [`Poller`] repeatedly fetches a fresh snapshot of external state and
//! evaluates a condition against it, up to a fixed retry budget, blocking the
//! calling thread for a fixed interval between attempts.
//!
//! ```text
//!            match                   no match, attempts remain
//! Polling ──────────► Success      Polling ──────────► (sleep) Polling
//!    │
//!    └── no match, budget spent ──► TimedOut
//! ```
//!
//! Every attempt calls the fetch function again; snapshots are never cached
//! across attempts. There is no sleep after the final attempt, so the total
//! wait is bounded by `(max_attempts - 1) * interval` plus fetch costs.
//!
//! Fetch errors are not retried: [`Poller::try_poll_until`] returns the first
//! error immediately. Callers that want swallow-and-retry semantics should map
//! a failed fetch to a snapshot that does not satisfy the condition.

use std::convert::Infallible;
use std::time::Duration;

use crate::prelude::*;

/// Default retry budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default wait between attempts
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed-count, fixed-interval retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl PollPolicy {
    /// Create a policy. `max_attempts` must be at least 1.
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::invalid_policy("max_attempts must be at least 1"));
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    /// Convenience constructor taking the interval in milliseconds.
    pub fn from_millis(max_attempts: u32, interval_ms: u64) -> Result<Self> {
        Self::new(max_attempts, Duration::from_millis(interval_ms))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound on time spent sleeping for a poll that times out.
    ///
    /// Saturates at [`Duration::MAX`].
    pub fn max_total_wait(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts - 1)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal state of a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The condition held on attempt `attempts`.
    Success { value: T, attempts: u32 },
    /// The retry budget was spent without the condition holding.
    TimedOut { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Success { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut { .. })
    }

    /// Number of fetches performed.
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Success { attempts, .. } | PollOutcome::TimedOut { attempts } => {
                *attempts
            }
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            PollOutcome::Success { value, .. } => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PollOutcome<U> {
        match self {
            PollOutcome::Success { value, attempts } => PollOutcome::Success {
                value: f(value),
                attempts,
            },
            PollOutcome::TimedOut { attempts } => PollOutcome::TimedOut { attempts },
        }
    }

    /// Treat a timeout as an error, for callers where it is fatal.
    pub fn into_result(self, what: impl Into<String>) -> Result<T> {
        match self {
            PollOutcome::Success { value, .. } => Ok(value),
            PollOutcome::TimedOut { attempts } => Err(Error::timed_out(what, attempts)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sleeping
// ─────────────────────────────────────────────────────────────────────────────

/// Blocks the calling thread between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Real sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested sleeps without blocking.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Poller
// ─────────────────────────────────────────────────────────────────────────────

/// Bounded poller with an injectable [`Sleeper`].
#[derive(Debug, Clone)]
pub struct Poller<Z = ThreadSleeper> {
    policy: PollPolicy,
    sleeper: Z,
}

impl Poller<ThreadSleeper> {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            sleeper: ThreadSleeper,
        }
    }
}

impl<Z: Sleeper> Poller<Z> {
    pub fn with_sleeper(policy: PollPolicy, sleeper: Z) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Core loop: fetch, evaluate, sleep. `extract` consumes the snapshot and
    /// yields a value once the awaited state is observed.
    pub fn try_find<S, T, E, F, X>(
        &self,
        mut fetch: F,
        mut extract: X,
    ) -> std::result::Result<PollOutcome<T>, E>
    where
        F: FnMut() -> std::result::Result<S, E>,
        X: FnMut(S) -> Option<T>,
    {
        let max = self.policy.max_attempts;

        for attempt in 1..=max {
            let snapshot = fetch()?;
            if let Some(value) = extract(snapshot) {
                trace!("Condition met on attempt {}/{}", attempt, max);
                return Ok(PollOutcome::Success {
                    value,
                    attempts: attempt,
                });
            }

            if attempt < max {
                debug!(
                    "Condition not met, retrying in {:?} (attempt {}/{})",
                    self.policy.interval, attempt, max
                );
                self.sleeper.sleep(self.policy.interval);
            }
        }

        warn!("Condition not met after {} attempt(s), giving up", max);
        Ok(PollOutcome::TimedOut { attempts: max })
    }

    /// Poll with a fallible fetch; the first fetch error aborts the poll.
    pub fn try_poll_until<S, E, F, C>(
        &self,
        fetch: F,
        mut condition: C,
    ) -> std::result::Result<PollOutcome<S>, E>
    where
        F: FnMut() -> std::result::Result<S, E>,
        C: FnMut(&S) -> bool,
    {
        self.try_find(fetch, |snapshot| condition(&snapshot).then_some(snapshot))
    }

    /// Poll with an infallible fetch, returning the matching snapshot.
    pub fn poll_until<S, F, C>(&self, mut fetch: F, condition: C) -> PollOutcome<S>
    where
        F: FnMut() -> S,
        C: FnMut(&S) -> bool,
    {
        infallible(self.try_poll_until(|| Ok::<_, Infallible>(fetch()), condition))
    }

    /// Poll with an infallible fetch until `extract` yields a value.
    pub fn find<S, T, F, X>(&self, mut fetch: F, extract: X) -> PollOutcome<T>
    where
        F: FnMut() -> S,
        X: FnMut(S) -> Option<T>,
    {
        infallible(self.try_find(|| Ok::<_, Infallible>(fetch()), extract))
    }
}

fn infallible<T>(res: std::result::Result<T, Infallible>) -> T {
    match res {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Free functions (real sleeping)
// ─────────────────────────────────────────────────────────────────────────────

/// Poll `fetch` until `condition` holds or `policy` is exhausted.
pub fn poll_until<S, F, C>(policy: PollPolicy, fetch: F, condition: C) -> PollOutcome<S>
where
    F: FnMut() -> S,
    C: FnMut(&S) -> bool,
{
    Poller::new(policy).poll_until(fetch, condition)
}

/// Fallible variant of [`poll_until`]; fetch errors fail fast.
pub fn try_poll_until<S, E, F, C>(
    policy: PollPolicy,
    fetch: F,
    condition: C,
) -> std::result::Result<PollOutcome<S>, E>
where
    F: FnMut() -> std::result::Result<S, E>,
    C: FnMut(&S) -> bool,
{
    Poller::new(policy).try_poll_until(fetch, condition)
}

/// Poll until `extract` yields a value from a fresh snapshot.
pub fn poll_find<S, T, F, X>(policy: PollPolicy, fetch: F, extract: X) -> PollOutcome<T>
where
    F: FnMut() -> S,
    X: FnMut(S) -> Option<T>,
{
    Poller::new(policy).find(fetch, extract)
}
