//! Reason codes for turn transitions

use serde::{Deserialize, Serialize};

/// Why the controller moved from one phase to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // T001: Acceptance
    // =========================================================================
    /// Reply passed the policy (or no policy configured)
    T001_REPLY_ACCEPTED,
    /// Refusal detected but the user declined the switch
    T001_SWITCH_DECLINED,
    /// Refusal detected but the per-turn switch budget is spent
    T001_SWITCH_BUDGET_EXHAUSTED,
    /// Refusal detected while already on the fallback model
    T001_ALREADY_ON_FALLBACK,

    // =========================================================================
    // T002: Switching
    // =========================================================================
    /// Reply matched the trigger set
    T002_REFUSAL_DETECTED,
    /// Reply was empty, go back to the primary model
    T002_EMPTY_REPLY,

    // =========================================================================
    // T003: Resend
    // =========================================================================
    /// Snapshot restored, resending with the fallback model
    T003_RESEND_FALLBACK,
    /// Snapshot restored, resending with the primary model
    T003_RESEND_PRIMARY,

    // =========================================================================
    // T004: Abort
    // =========================================================================
    /// Transport, status or decode failure
    T004_CALL_FAILED,
    /// Empty-reply cap reached
    T004_EMPTY_RETRIES_EXHAUSTED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::T001_REPLY_ACCEPTED => "T001_REPLY_ACCEPTED",
            Self::T001_SWITCH_DECLINED => "T001_SWITCH_DECLINED",
            Self::T001_SWITCH_BUDGET_EXHAUSTED => "T001_SWITCH_BUDGET_EXHAUSTED",
            Self::T001_ALREADY_ON_FALLBACK => "T001_ALREADY_ON_FALLBACK",
            Self::T002_REFUSAL_DETECTED => "T002_REFUSAL_DETECTED",
            Self::T002_EMPTY_REPLY => "T002_EMPTY_REPLY",
            Self::T003_RESEND_FALLBACK => "T003_RESEND_FALLBACK",
            Self::T003_RESEND_PRIMARY => "T003_RESEND_PRIMARY",
            Self::T004_CALL_FAILED => "T004_CALL_FAILED",
            Self::T004_EMPTY_RETRIES_EXHAUSTED => "T004_EMPTY_RETRIES_EXHAUSTED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::T001_REPLY_ACCEPTED => "Reply accepted",
            Self::T001_SWITCH_DECLINED => "Switch declined by user",
            Self::T001_SWITCH_BUDGET_EXHAUSTED => "Switch budget exhausted for this turn",
            Self::T001_ALREADY_ON_FALLBACK => "Already on the fallback model",
            Self::T002_REFUSAL_DETECTED => "Reply looks like a refusal",
            Self::T002_EMPTY_REPLY => "Model returned an empty message",
            Self::T003_RESEND_FALLBACK => "Retrying with the fallback model",
            Self::T003_RESEND_PRIMARY => "Retrying with the primary model",
            Self::T004_CALL_FAILED => "Model call failed",
            Self::T004_EMPTY_RETRIES_EXHAUSTED => "Too many empty replies",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
