//! Result of one user turn

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ReasonCode, TurnPhase};

/// One edge of the turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TurnPhase,
    pub to: TurnPhase,
    pub reason: ReasonCode,
}

/// Output structure for each resolved turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// When the turn resolved
    pub timestamp: DateTime<Utc>,
    /// Accepted or Aborted
    pub phase: TurnPhase,
    /// Stored reply text (Accepted only)
    pub reply: Option<String>,
    /// Model active when the turn resolved
    pub model: String,
    /// Trigger-based switches taken this turn
    pub switches: u32,
    /// Empty-reply reverts taken this turn
    pub empty_retries: u32,
    /// Every phase change, in order
    pub transitions: Vec<Transition>,
    /// Failure text (Aborted only)
    pub error: Option<String>,
}

impl TurnOutcome {
    /// Was the reply stored?
    pub fn is_accepted(&self) -> bool {
        self.phase == TurnPhase::Accepted
    }

    /// Reason attached to the final transition
    pub fn final_reason(&self) -> Option<ReasonCode> {
        self.transitions.last().map(|t| t.reason)
    }

    /// Transitions that the user should hear about (switches and reverts)
    pub fn notices(&self) -> impl Iterator<Item = &Transition> {
        self.transitions
            .iter()
            .filter(|t| matches!(t.to, TurnPhase::Switched | TurnPhase::Reverted))
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | model={} | switches={} | empty_retries={} | reason={}",
            self.phase,
            self.model,
            self.switches,
            self.empty_retries,
            self.final_reason().map(|r| r.code()).unwrap_or("-"),
        )
    }
}
