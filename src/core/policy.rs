//! Switching policy: decides whether a reply looks like a refusal
//!
//! Pure OR over a fixed, case-insensitive trigger set. No state, no side
//! effects; the same text always gives the same answer.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Default refusal triggers, matched case-insensitively
pub const DEFAULT_TRIGGERS: &[&str] = &[
    r"\bI (?:can't|cannot|won't|am unable to|refuse to) (?:help|assist|comply)\b",
    r"\bI (?:can't|cannot) (?:provide|give|offer)\b",
    r"\bI (?:won't|cannot|can't) (?:be able to)\b",
    r"\bI (?:can't|cannot) comply\b",
    r"\b(?:can't|cannot|unable to) (?:assist|help) (?:with|on)\b",
    r"\bnot allowed\b",
    r"\bforbidden\b",
    r"\billegal\b",
    r"\b(?:cannot|can't) provide instructions\b",
    r"\b(?:harmful|incorrect) information\b",
    r"\bethical concerns\b",
];

lazy_static! {
    static ref DEFAULT_SET: Vec<Regex> = DEFAULT_TRIGGERS
        .iter()
        .map(|p| compile(p).expect("default trigger patterns are valid"))
        .collect();
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Evaluator over an ordered trigger set
#[derive(Debug, Clone)]
pub struct SwitchPolicy {
    triggers: Vec<Regex>,
}

impl Default for SwitchPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchPolicy {
    /// Policy with the built-in refusal triggers
    pub fn new() -> Self {
        Self {
            triggers: DEFAULT_SET.clone(),
        }
    }

    /// Policy with a custom trigger set
    pub fn with_patterns<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let triggers = patterns
            .into_iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { triggers })
    }

    /// True iff the reply is present, non-empty and matches any trigger
    pub fn evaluate(&self, reply: Option<&str>) -> bool {
        reply.is_some_and(|text| self.should_switch(text))
    }

    /// `evaluate` for text that is known to be present
    pub fn should_switch(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// Source of the first trigger that matches, in set order
    pub fn first_match(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        self.triggers
            .iter()
            .find(|rx| rx.is_match(text))
            .map(|rx| rx.as_str())
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
