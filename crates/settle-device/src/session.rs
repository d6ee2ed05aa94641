//! Wait sessions
//!
//! A [`WaitSession`] bundles everything one test run needs to observe the
//! device: the log source, the retry policy and the current separator. It is
//! created per run and passed explicitly; nothing is shared between runs.

use settle_core::prelude::*;
use settle_core::{
    LinePattern, PollOutcome, PollPolicy, Poller, RetryValidator, Sleeper, ThreadSleeper,
};

use crate::lifecycle::{LifecycleCounter, LifecycleTally};
use crate::log_source::LogSource;
use crate::separator::{after_separator, LogSeparator};

/// Context object scoped to a single run.
pub struct WaitSession<Z = ThreadSleeper> {
    source: Box<dyn LogSource>,
    policy: PollPolicy,
    sleeper: Z,
    separator: Option<LogSeparator>,
}

impl WaitSession<ThreadSleeper> {
    pub fn new(source: Box<dyn LogSource>, policy: PollPolicy) -> Self {
        Self::with_sleeper(source, policy, ThreadSleeper)
    }
}

impl<Z: Sleeper> WaitSession<Z> {
    pub fn with_sleeper(source: Box<dyn LogSource>, policy: PollPolicy, sleeper: Z) -> Self {
        Self {
            source,
            policy,
            sleeper,
            separator: None,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn separator(&self) -> Option<&LogSeparator> {
        self.separator.as_ref()
    }

    fn poller(&self) -> Poller<&Z> {
        Poller::with_sleeper(self.policy, &self.sleeper)
    }

    /// Write a fresh separator to the log; later reads start after it.
    pub fn separate_logs(&mut self) -> Result<LogSeparator> {
        let separator = LogSeparator::new();
        self.source.mark(&separator)?;
        debug!("Wrote log separator {}", separator);
        self.separator = Some(separator.clone());
        Ok(separator)
    }

    /// Forget the current separator so reads see the whole log again.
    pub fn clear_separator(&mut self) {
        self.separator = None;
    }

    /// Fetch the records for `components` written after the separator.
    pub fn device_logs(&self, components: &[String]) -> Result<Vec<String>> {
        let lines = self.source.fetch(components)?;
        Ok(after_separator(lines, self.separator.as_ref()))
    }

    /// Poll fresh records for `components` until `extract` yields a value.
    /// Fetch errors abort the poll.
    pub fn poll<T, X>(&self, components: &[String], extract: X) -> Result<PollOutcome<T>>
    where
        X: FnMut(Vec<String>) -> Option<T>,
    {
        self.poller().try_find(|| self.device_logs(components), extract)
    }

    /// Wait until a record matching `pattern` appears; returns that record.
    pub fn wait_for_line(
        &self,
        pattern: &LinePattern,
        components: &[String],
    ) -> Result<PollOutcome<String>> {
        self.poll(components, |lines| {
            let found = pattern.first_match(&lines);
            if found.is_none() {
                info!("***Waiting for '{}' in {:?}", pattern, components);
            }
            found
        })
    }

    /// Wait until a record matches; returns the capture groups of the last
    /// matching record.
    pub fn wait_for_last_match(
        &self,
        pattern: &LinePattern,
        components: &[String],
    ) -> Result<PollOutcome<Vec<String>>> {
        self.poll(components, |lines| pattern.last_match(&lines))
    }

    /// Wait until the tally of `counter`'s events satisfies `condition`.
    ///
    /// The tally from the final fetch is returned alongside the outcome, so
    /// a timed-out wait can still report what was observed.
    pub fn wait_for_tally<C>(
        &self,
        counter: &LifecycleCounter,
        components: &[String],
        mut condition: C,
    ) -> Result<(PollOutcome<()>, LifecycleTally)>
    where
        C: FnMut(&LifecycleTally) -> bool,
    {
        let mut last = None;
        let outcome = self.poll(components, |lines| {
            let tally = counter.tally(&lines);
            let done = condition(&tally);
            last = Some(tally);
            done.then_some(())
        })?;
        let last = last.unwrap_or_else(|| counter.tally::<String>(&[]));
        Ok((outcome, last))
    }

    /// Retry `validate` against fresh tallies; fetch errors fail fast.
    pub fn assert_tally<V>(
        &self,
        counter: &LifecycleCounter,
        components: &[String],
        waiting_message: &str,
        mut validate: V,
    ) -> Result<()>
    where
        V: FnMut(&LifecycleTally) -> Option<String>,
    {
        RetryValidator::new(self.poller()).try_assert_valid(
            waiting_message,
            || self.device_logs(components).map(|lines| counter.tally(&lines)),
            |tally| validate(tally),
        )
    }

    /// Like [`wait_for_line`](Self::wait_for_line), but a timeout is an error.
    pub fn assert_line(
        &self,
        pattern: &LinePattern,
        components: &[String],
        what: &str,
    ) -> Result<String> {
        self.wait_for_line(pattern, components)?.into_result(what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedLogSource, Step};
    use settle_core::RecordingSleeper;

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn session<'a>(
        source: &ScriptedLogSource,
        sleeper: &'a RecordingSleeper,
    ) -> WaitSession<&'a RecordingSleeper> {
        WaitSession::with_sleeper(
            Box::new(source.clone()),
            PollPolicy::from_millis(5, 500).unwrap(),
            sleeper,
        )
    }

    #[test]
    fn test_wait_for_line_succeeds_on_third_fetch() {
        let source = ScriptedLogSource::new(vec![
            Step::lines(&["ActivityLauncher: launching"]),
            Step::lines(&[]),
            Step::lines(&["ActivityLauncher: SecurityException launching activity"]),
        ]);
        let sleeper = RecordingSleeper::new();
        let session = session(&source, &sleeper);
        let pattern = LinePattern::new(".*SecurityException launching activity.*").unwrap();

        let outcome = session
            .wait_for_line(&pattern, &tags(&["ActivityLauncher"]))
            .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Success {
                value: "ActivityLauncher: SecurityException launching activity".to_string(),
                attempts: 3
            }
        );
        assert_eq!(source.fetch_count(), 3);
        assert_eq!(sleeper.count(), 2);
    }

    #[test]
    fn test_separator_hides_earlier_records() {
        let source = ScriptedLogSource::new(vec![Step::lines(&["A: onResume"])]);
        let sleeper = RecordingSleeper::new();
        let mut session = session(&source, &sleeper);

        assert_eq!(session.device_logs(&[]).unwrap(), tags(&["A: onResume"]));

        let sep = session.separate_logs().unwrap();
        assert_eq!(session.separator(), Some(&sep));
        assert!(session.device_logs(&[]).unwrap().is_empty());

        session.clear_separator();
        assert_eq!(session.device_logs(&[]).unwrap().len(), 2);
    }

    #[test]
    fn test_assert_line_times_out() {
        let source = ScriptedLogSource::new(vec![Step::lines(&["noise"])]);
        let sleeper = RecordingSleeper::new();
        let session = session(&source, &sleeper);
        let pattern = LinePattern::new("never").unwrap();

        let err = session
            .assert_line(&pattern, &[], "exception for ActivityLauncher")
            .unwrap_err();

        assert!(matches!(err, Error::TimedOut { attempts: 5, .. }));
        assert_eq!(source.fetch_count(), 5);
        assert_eq!(sleeper.count(), 4);
    }

    #[test]
    fn test_fetch_error_aborts_wait() {
        let source = ScriptedLogSource::new(vec![
            Step::lines(&["noise"]),
            Step::fail("device offline"),
            Step::lines(&["match"]),
        ]);
        let sleeper = RecordingSleeper::new();
        let session = session(&source, &sleeper);

        let err = session
            .wait_for_line(&LinePattern::new("match").unwrap(), &[])
            .unwrap_err();

        assert!(matches!(err, Error::Fetch { .. }));
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(sleeper.count(), 1);
    }

    #[test]
    fn test_wait_for_last_match_returns_latest_captures() {
        let source = ScriptedLogSource::new(vec![Step::lines(&[
            "A: size w=100 h=200",
            "A: size w=300 h=400",
        ])]);
        let sleeper = RecordingSleeper::new();
        let session = session(&source, &sleeper);
        let pattern = LinePattern::new(r"(.+): size w=(\d+) h=(\d+)").unwrap();

        let captures = session
            .wait_for_last_match(&pattern, &[])
            .unwrap()
            .value()
            .unwrap();

        assert_eq!(captures, tags(&["A", "300", "400"]));
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn test_wait_for_tally_reports_last_snapshot() {
        let source = ScriptedLogSource::new(vec![
            Step::lines(&["A: onCreate"]),
            Step::lines(&["A: onMultiWindowModeChanged"]),
        ]);
        let sleeper = RecordingSleeper::new();
        let session = session(&source, &sleeper);
        let counter = LifecycleCounter::new(&["onCreate", "onMultiWindowModeChanged"]).unwrap();

        let (outcome, tally) = session
            .wait_for_tally(&counter, &[], |t| t.count("onMultiWindowModeChanged") >= 1)
            .unwrap();

        assert_eq!(outcome.attempts(), 2);
        assert!(outcome.is_success());
        assert_eq!(tally.count("onCreate"), 1);

        let (outcome, tally) = session
            .wait_for_tally(&counter, &[], |t| t.count("onCreate") >= 2)
            .unwrap();
        assert!(outcome.is_timed_out());
        assert_eq!(tally.counters(), "1/1");
    }

    #[test]
    fn test_assert_tally_reports_last_reason() {
        let source = ScriptedLogSource::new(vec![Step::lines(&["A: onCreate"])]);
        let sleeper = RecordingSleeper::new();
        let session = session(&source, &sleeper);
        let counter = LifecycleCounter::new(&["onCreate", "onDestroy"]).unwrap();

        let err = session
            .assert_tally(&counter, &[], "***Waiting for activity destroyed", |t| {
                (t.count("onDestroy") != 1).then(|| {
                    format!(
                        "A has been destroyed {} time(s), expecting single destruction.",
                        t.count("onDestroy")
                    )
                })
            })
            .unwrap_err();

        match err {
            Error::ValidationFailed { reason } => {
                assert!(reason.contains("destroyed 0 time(s)"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
