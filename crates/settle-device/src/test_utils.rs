//! Test utilities for log sources
//!
//! Provides a scripted, in-memory [`LogSource`] that behaves like a dumped
//! device log: each fetch appends the next scripted step's records to the log
//! and returns the whole log. Once the script runs out the log stops growing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use settle_core::prelude::*;

use crate::log_source::{filter_lines, LogSource};
use crate::separator::LogSeparator;

/// One scripted fetch.
#[derive(Debug, Clone)]
pub enum Step {
    /// Append these records, then return the log.
    Lines(Vec<String>),
    /// Fail the fetch with [`Error::Fetch`].
    Fail(String),
}

impl Step {
    pub fn lines(lines: &[&str]) -> Self {
        Step::Lines(lines.iter().map(|s| s.to_string()).collect())
    }

    pub fn fail(message: &str) -> Self {
        Step::Fail(message.to_string())
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    script: VecDeque<Step>,
    log: Vec<String>,
    fetches: usize,
    marks: Vec<LogSeparator>,
}

/// In-memory log source driven by a script. Clones share state, so a test
/// can keep a handle after boxing one into a session.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLogSource {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedLogSource {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ScriptState {
                script: script.into(),
                ..Default::default()
            })),
        }
    }

    /// Number of fetches performed, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.state.borrow().fetches
    }

    pub fn marks(&self) -> Vec<LogSeparator> {
        self.state.borrow().marks.clone()
    }

    /// Append records outside the script, as if another process logged them.
    pub fn push_line(&self, line: &str) {
        self.state.borrow_mut().log.push(line.to_string());
    }
}

impl LogSource for ScriptedLogSource {
    fn fetch(&self, components: &[String]) -> Result<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.fetches += 1;

        let next = state.script.pop_front();
        match next {
            Some(Step::Lines(lines)) => state.log.extend(lines),
            Some(Step::Fail(message)) => return Err(Error::fetch(message)),
            None => {}
        }

        Ok(filter_lines(state.log.clone(), components))
    }

    fn mark(&self, separator: &LogSeparator) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.log.push(separator.log_line());
        state.marks.push(separator.clone());
        Ok(())
    }
}
