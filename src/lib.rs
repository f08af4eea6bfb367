//! lmswitch: chat loops against a local OpenAI-compatible endpoint
//!
//! Assistant mode: tools + refusal-triggered fallback to a second model.
//! Game mode: "The Jeff" Game Master with bounded session counters.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// ENDPOINT
// =============================================================================

/// LM Studio's default OpenAI-compatible base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";

/// LM Studio ignores the key but the header must be present
pub const DEFAULT_API_KEY: &str = "lm-studio";

/// Per-request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// MODELS
// =============================================================================

/// Primary model for assistant mode
pub const DEFAULT_MODEL: &str = "qwen3-8b";

/// Model substituted after a detected refusal
pub const FALLBACK_MODEL: &str = "unfilteredai_dan-qwen3-1.7b";

/// Model for game mode (no fallback by default)
pub const GAME_MODEL: &str = "qwen/qwen3-8b";

// =============================================================================
// SWITCHING POLICY
// =============================================================================

/// Trigger-based switches allowed per user turn
pub const MAX_SWITCHES_PER_TURN: u32 = 1;

/// Tool-call rounds resolved before the reply text is judged
pub const MAX_TOOL_ROUNDS: u32 = 1;

// =============================================================================
// GAME COUNTERS
// =============================================================================

/// Faction slider bounds: -5 is Earthbound, 5 is Homeward
pub const FACTION_MIN: i32 = -5;
pub const FACTION_MAX: i32 = 5;

/// Chaos counter bounds; reaching the top triggers a breakdown
pub const CHAOS_MIN: i32 = 0;
pub const CHAOS_MAX: i32 = 10;

/// Value a counter rests at after an extreme event
pub const COUNTER_REST: i32 = 0;

/// Default roster file for game mode
pub const DEFAULT_PLAYERS_FILE: &str = "players.yaml";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
