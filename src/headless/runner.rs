//! Wait runner - one bounded wait for a log line
//!
//! Drives a [`WaitSession`] for a single request and reports progress as
//! [`HeadlessEvent`]s. The caller decides whether events go to stdout.

use settle_core::prelude::*;
use settle_core::{LinePattern, PollOutcome, Sleeper};
use settle_device::WaitSession;

use super::HeadlessEvent;

/// What to wait for
#[derive(Debug, Clone)]
pub struct WaitRequest {
    pub pattern: LinePattern,
    pub components: Vec<String>,
    /// Write a separator first and ignore earlier records
    pub separate: bool,
    /// Report capture groups of the last matching record
    pub last: bool,
}

/// Terminal result of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitReport {
    Matched {
        attempts: u32,
        line: Option<String>,
        captures: Option<Vec<String>>,
    },
    TimedOut {
        attempts: u32,
    },
}

impl WaitReport {
    /// Process exit code: 0 when matched, 1 when timed out.
    pub fn exit_code(&self) -> i32 {
        match self {
            WaitReport::Matched { .. } => 0,
            WaitReport::TimedOut { .. } => 1,
        }
    }
}

/// Run one wait, emitting events as it progresses.
pub fn run_wait<Z: Sleeper>(
    session: &mut WaitSession<Z>,
    request: &WaitRequest,
    emit: &mut dyn FnMut(HeadlessEvent),
) -> Result<WaitReport> {
    let result = wait(session, request, emit);
    if let Err(e) = &result {
        error!("Wait failed: {}", e);
        emit(HeadlessEvent::error(e.to_string(), e.is_fatal()));
    }
    result
}

fn wait<Z: Sleeper>(
    session: &mut WaitSession<Z>,
    request: &WaitRequest,
    emit: &mut dyn FnMut(HeadlessEvent),
) -> Result<WaitReport> {
    let policy = session.policy();
    let max_attempts = policy.max_attempts();

    info!(
        "Waiting for '{}' in {:?} ({} attempt(s), {:?} apart)",
        request.pattern,
        request.components,
        max_attempts,
        policy.interval()
    );
    emit(HeadlessEvent::wait_started(
        request.pattern.as_str(),
        &request.components,
        max_attempts,
        policy.interval().as_millis() as u64,
    ));

    if request.separate {
        let separator = session.separate_logs()?;
        emit(HeadlessEvent::separator_written(separator.as_str()));
    }

    let pattern = &request.pattern;
    let mut attempt = 0;
    let outcome = session.poll(&request.components, |lines| {
        attempt += 1;
        let found = if request.last {
            pattern.last_match(&lines).map(|captures| (None, Some(captures)))
        } else {
            pattern.first_match(&lines).map(|line| (Some(line), None))
        };
        if found.is_none() {
            emit(HeadlessEvent::attempt_failed(
                attempt,
                max_attempts,
                lines.len(),
            ));
        }
        found
    })?;

    let report = match outcome {
        PollOutcome::Success {
            value: (line, captures),
            attempts,
        } => {
            info!("Matched on attempt {}/{}", attempts, max_attempts);
            emit(HeadlessEvent::matched(attempts, line.clone(), captures.clone()));
            WaitReport::Matched {
                attempts,
                line,
                captures,
            }
        }
        PollOutcome::TimedOut { attempts } => {
            warn!("Timed out waiting for '{}'", request.pattern);
            emit(HeadlessEvent::timed_out(attempts));
            WaitReport::TimedOut { attempts }
        }
    };

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use settle_core::{PollPolicy, RecordingSleeper};
    use settle_device::test_utils::{ScriptedLogSource, Step};

    fn request(pattern: &str, separate: bool, last: bool) -> WaitRequest {
        WaitRequest {
            pattern: LinePattern::new(pattern).unwrap(),
            components: vec!["TestActivity".to_string()],
            separate,
            last,
        }
    }

    fn run(
        source: &ScriptedLogSource,
        sleeper: &RecordingSleeper,
        request: &WaitRequest,
    ) -> (Result<WaitReport>, Vec<HeadlessEvent>) {
        let mut session = WaitSession::with_sleeper(
            Box::new(source.clone()),
            PollPolicy::from_millis(5, 500).unwrap(),
            sleeper,
        );
        let mut events = Vec::new();
        let result = run_wait(&mut session, request, &mut |e| events.push(e));
        (result, events)
    }

    fn kinds(events: &[HeadlessEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                HeadlessEvent::WaitStarted { .. } => "wait_started",
                HeadlessEvent::SeparatorWritten { .. } => "separator_written",
                HeadlessEvent::AttemptFailed { .. } => "attempt_failed",
                HeadlessEvent::Matched { .. } => "matched",
                HeadlessEvent::TimedOut { .. } => "timed_out",
                HeadlessEvent::Error { .. } => "error",
            })
            .collect()
    }

    #[test]
    fn test_match_on_second_attempt() {
        let source = ScriptedLogSource::new(vec![
            Step::lines(&["TestActivity: onCreate"]),
            Step::lines(&["TestActivity: onResume"]),
        ]);
        let sleeper = RecordingSleeper::new();

        let (result, events) = run(&source, &sleeper, &request("(.+): onResume", false, false));

        assert_eq!(
            result.unwrap(),
            WaitReport::Matched {
                attempts: 2,
                line: Some("TestActivity: onResume".to_string()),
                captures: None,
            }
        );
        assert_eq!(kinds(&events), vec!["wait_started", "attempt_failed", "matched"]);
        assert_eq!(sleeper.count(), 1);
    }

    #[test]
    fn test_timeout_emits_one_failure_per_attempt() {
        let source = ScriptedLogSource::new(vec![Step::lines(&["TestActivity: onCreate"])]);
        let sleeper = RecordingSleeper::new();

        let (result, events) = run(&source, &sleeper, &request("(.+): onDestroy", false, false));

        let report = result.unwrap();
        assert_eq!(report, WaitReport::TimedOut { attempts: 5 });
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, HeadlessEvent::AttemptFailed { .. }))
                .count(),
            5
        );
        assert_eq!(sleeper.count(), 4);
    }

    #[test]
    fn test_separate_ignores_earlier_records() {
        let source = ScriptedLogSource::new(vec![]);
        source.push_line("TestActivity: onResume");
        let sleeper = RecordingSleeper::new();

        let (result, events) = run(&source, &sleeper, &request("(.+): onResume", true, false));

        assert!(matches!(result.unwrap(), WaitReport::TimedOut { .. }));
        assert_eq!(kinds(&events)[..2], ["wait_started", "separator_written"]);
        assert_eq!(source.marks().len(), 1);
    }

    #[test]
    fn test_last_reports_captures() {
        let source = ScriptedLogSource::new(vec![Step::lines(&[
            "TestActivity: size=100x200",
            "TestActivity: size=300x400",
        ])]);
        let sleeper = RecordingSleeper::new();

        let (result, _) = run(
            &source,
            &sleeper,
            &request(r"(.+): size=(\d+)x(\d+)", false, true),
        );

        assert_eq!(
            result.unwrap(),
            WaitReport::Matched {
                attempts: 1,
                line: None,
                captures: Some(vec![
                    "TestActivity".to_string(),
                    "300".to_string(),
                    "400".to_string()
                ]),
            }
        );
    }

    #[test]
    fn test_fetch_error_emits_error_event() {
        let source = ScriptedLogSource::new(vec![Step::fail("device offline")]);
        let sleeper = RecordingSleeper::new();

        let (result, events) = run(&source, &sleeper, &request("x", false, false));

        assert!(matches!(result, Err(Error::Fetch { .. })));
        assert_eq!(kinds(&events), vec!["wait_started", "error"]);
        assert_eq!(sleeper.count(), 0);
    }
}
