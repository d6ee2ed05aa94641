//! Waits against a real file that another thread writes to

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use settle::core::{poll_until, LinePattern, PollPolicy};
use settle::device::{FileLogSource, LogSource, WaitSession};
use settle::{run_wait, WaitReport, WaitRequest};
use tempfile::TempDir;

fn append(path: &Path, line: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    writeln!(file, "{line}").unwrap();
}

#[test]
fn test_line_written_later_is_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("device.log");
    append(&path, "I/TestActivity( 1): onCreate");

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        append(&writer_path, "I/TestActivity( 1): onResume");
    });

    let session = WaitSession::new(
        Box::new(FileLogSource::new(&path)),
        PollPolicy::from_millis(40, 50).unwrap(),
    );
    let outcome = session
        .wait_for_line(
            &LinePattern::new("(.+): onResume").unwrap(),
            &["TestActivity".to_string()],
        )
        .unwrap();
    writer.join().unwrap();

    assert!(outcome.is_success());
    assert!(outcome.attempts() > 1);
}

#[test]
fn test_separator_then_wait() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("device.log");
    append(&path, "I/TestActivity( 1): onResume");

    let mut session = WaitSession::new(
        Box::new(FileLogSource::new(&path)),
        PollPolicy::from_millis(3, 10).unwrap(),
    );
    let request = WaitRequest {
        pattern: LinePattern::new("(.+): onResume").unwrap(),
        components: vec!["TestActivity".to_string()],
        separate: true,
        last: false,
    };

    let report = run_wait(&mut session, &request, &mut |_| {}).unwrap();
    assert_eq!(report, WaitReport::TimedOut { attempts: 3 });

    append(&path, "I/TestActivity( 1): onResume");
    let request = WaitRequest {
        separate: false,
        ..request
    };
    let report = run_wait(&mut session, &request, &mut |_| {}).unwrap();
    assert!(matches!(report, WaitReport::Matched { attempts: 1, .. }));
}

#[test]
fn test_timeout_elapsed_is_bounded_below() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("device.log");
    append(&path, "noise");
    let source = FileLogSource::new(&path);

    let start = Instant::now();
    let outcome = poll_until(
        PollPolicy::from_millis(5, 100).unwrap(),
        || source.fetch(&[]).unwrap_or_default(),
        |lines| lines.iter().any(|l| l == "never"),
    );

    assert!(outcome.is_timed_out());
    assert_eq!(outcome.attempts(), 5);
    assert!(start.elapsed() >= Duration::from_millis(400));
}
