//! Lifecycle event tallies
//!
//! Counts records of the form `<tag>: <event>` in a log snapshot. Line
//! indices are 1-based positions within the snapshot.

use std::collections::HashMap;

use settle_core::prelude::*;
use settle_core::LinePattern;

/// Compiled set of event names to tally.
#[derive(Debug, Clone)]
pub struct LifecycleCounter {
    events: Vec<(String, LinePattern)>,
}

impl LifecycleCounter {
    pub fn new<S: AsRef<str>>(events: &[S]) -> Result<Self> {
        let events = events
            .iter()
            .map(|e| -> Result<(String, LinePattern)> {
                let e = e.as_ref();
                let pattern = LinePattern::new(&format!("(.+): {}", regex::escape(e)))?;
                Ok((e.to_string(), pattern))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { events })
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|(name, _)| name.as_str())
    }

    /// Tally one snapshot. A line counts towards the first event it matches.
    pub fn tally<S: AsRef<str>>(&self, lines: &[S]) -> LifecycleTally {
        let mut tally = LifecycleTally {
            order: self.events.iter().map(|(name, _)| name.clone()).collect(),
            counts: HashMap::new(),
            last_index: HashMap::new(),
        };

        for (idx, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if let Some((name, _)) = self.events.iter().find(|(_, p)| p.matches(line)) {
                *tally.counts.entry(name.clone()).or_insert(0) += 1;
                tally.last_index.insert(name.clone(), idx + 1);
            }
        }

        tally
    }
}

/// Event counts observed in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTally {
    order: Vec<String>,
    counts: HashMap<String, usize>,
    last_index: HashMap<String, usize>,
}

impl LifecycleTally {
    pub fn count(&self, event: &str) -> usize {
        self.counts.get(event).copied().unwrap_or(0)
    }

    /// 1-based line index of the last occurrence of `event`.
    pub fn last_index(&self, event: &str) -> Option<usize> {
        self.last_index.get(event).copied()
    }

    /// Counts in event order, joined with `/`.
    pub fn counters(&self) -> String {
        self.order
            .iter()
            .map(|e| self.count(e).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for LifecycleTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .order
            .iter()
            .map(|e| format!("{e}={}", self.count(e)))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
