//! Turn phase definitions

use colored::Color;
use serde::{Deserialize, Serialize};

/// Phases a single user turn moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    /// First call for this turn is in flight
    Sent,
    /// Refusal detected, history rolled back, fallback selected
    Switched,
    /// Empty reply, history rolled back, primary selected
    Reverted,
    /// Same user message sent again with the new model
    Resent,
    /// Reply stored in history
    Accepted,
    /// Call failed, nothing stored
    Aborted,
}

impl TurnPhase {
    /// Terminal phases end the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnPhase::Accepted | TurnPhase::Aborted)
    }

    /// Terminal color for notices
    pub fn color(&self) -> Color {
        match self {
            TurnPhase::Sent | TurnPhase::Resent => Color::BrightBlack,
            TurnPhase::Switched => Color::Yellow,
            TurnPhase::Reverted => Color::Magenta,
            TurnPhase::Accepted => Color::Green,
            TurnPhase::Aborted => Color::Red,
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnPhase::Sent => "SENT",
            TurnPhase::Switched => "SWITCHED",
            TurnPhase::Reverted => "REVERTED",
            TurnPhase::Resent => "RESENT",
            TurnPhase::Accepted => "ACCEPTED",
            TurnPhase::Aborted => "ABORTED",
        };
        write!(f, "{}", name)
    }
}
