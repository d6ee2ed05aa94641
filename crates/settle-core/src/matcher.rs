//! Whole-line regex matching over log snapshots

use regex::Regex;

use crate::prelude::*;

/// A regex that must match an entire (trimmed) record.
#[derive(Debug, Clone)]
pub struct LinePattern {
    source: String,
    regex: Regex,
}

impl LinePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Pattern matching any line that contains `fragment` literally.
    pub fn contains(fragment: &str) -> Result<Self> {
        Self::new(&format!(".*{}.*", regex::escape(fragment)))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line.trim())
    }

    pub fn any_match<S: AsRef<str>>(&self, lines: &[S]) -> bool {
        lines.iter().any(|l| self.matches(l.as_ref()))
    }

    pub fn first_match<S: AsRef<str>>(&self, lines: &[S]) -> Option<String> {
        lines
            .iter()
            .map(|l| l.as_ref().trim())
            .find(|l| self.regex.is_match(l))
            .map(str::to_string)
    }

    /// Capture groups (group 1 onward) of the last matching line.
    ///
    /// Unmatched optional groups are returned as empty strings.
    pub fn last_match<S: AsRef<str>>(&self, lines: &[S]) -> Option<Vec<String>> {
        lines.iter().rev().find_map(|l| {
            self.regex.captures(l.as_ref().trim()).map(|caps| {
                caps.iter()
                    .skip(1)
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect()
            })
        })
    }

    pub fn count<S: AsRef<str>>(&self, lines: &[S]) -> usize {
        lines.iter().filter(|l| self.matches(l.as_ref())).count()
    }
}

impl std::fmt::Display for LinePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
