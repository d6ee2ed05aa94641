//! Tests against a captured `logcat -v brief` dump

use settle::core::LinePattern;
use settle::device::{after_separator, LifecycleCounter, LogSeparator};

fn fixture_lines() -> Vec<String> {
    include_str!("fixtures/logcat_brief.txt")
        .lines()
        .map(str::to_string)
        .collect()
}

fn separator() -> LogSeparator {
    LogSeparator::from_token("6f1c2a9e-3b5d-4c1e-9a7f-0d2e4b6c8a10")
}

#[test]
fn test_tally_after_separator() {
    let counter =
        LifecycleCounter::new(&["onCreate", "onResume", "onPause", "onConfigurationChanged"])
            .unwrap();

    let all = counter.tally(&fixture_lines());
    assert_eq!(all.count("onCreate"), 1);
    assert_eq!(all.count("onResume"), 2);

    let after = counter.tally(&after_separator(fixture_lines(), Some(&separator())));
    assert_eq!(after.count("onCreate"), 0);
    assert_eq!(after.count("onResume"), 1);
    assert_eq!(after.count("onPause"), 1);
    assert_eq!(after.count("onConfigurationChanged"), 1);
    assert_eq!(after.last_index("onConfigurationChanged"), Some(2));
}

#[test]
fn test_reported_sizes_capture() {
    let pattern = LinePattern::new(
        r"(.+): config size=(\d+)x(\d+) displaySize=(\d+)x(\d+) metricsSize=(\d+)x(\d+) smallestScreenWidth=(\d+) densityDpi=(\d+) orientation=(\d+)",
    )
    .unwrap();

    let captures = pattern.last_match(&fixture_lines()).unwrap();

    assert_eq!(captures.len(), 10);
    assert_eq!(captures[1], "411");
    assert_eq!(captures[2], "683");
    assert_eq!(captures[8], "420");
    assert_eq!(captures[9], "1");
}

#[test]
fn test_security_exception_line() {
    let pattern = LinePattern::new(".*SecurityException launching activity.*").unwrap();
    assert!(pattern.any_match(&fixture_lines()));
}
