//! Process-start configuration
//!
//! Defaults come from the constants in `lib.rs`; the CLI may override them
//! once at start-up. Nothing here changes while a session runs.

use std::time::Duration;

use crate::{
    DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
    FALLBACK_MODEL, MAX_SWITCHES_PER_TURN, MAX_TOOL_ROUNDS,
};

/// Where and how to reach the chat-completion endpoint
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl EndpointConfig {
    /// Full URL of the completions route
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Fallback half of the switching policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackConfig {
    /// Model substituted after a refusal
    pub model: String,
    /// Trigger-based switches allowed per user turn
    pub max_switches_per_turn: u32,
    /// Cap on empty-reply reverts per turn; `None` keeps retrying
    pub max_empty_retries: Option<u32>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            model: FALLBACK_MODEL.to_string(),
            max_switches_per_turn: MAX_SWITCHES_PER_TURN,
            max_empty_retries: None,
        }
    }
}

/// Turn controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchConfig {
    /// Model used by default and restored after an empty reply
    pub primary_model: String,
    /// `None` disables switching and empty-reply recovery
    pub fallback: Option<FallbackConfig>,
    /// Tool-call rounds resolved before the reply is judged
    pub max_tool_rounds: u32,
    /// Declare tools again on the follow-up call after tool results
    pub tools_on_followup: bool,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            primary_model: DEFAULT_MODEL.to_string(),
            fallback: Some(FallbackConfig::default()),
            max_tool_rounds: MAX_TOOL_ROUNDS,
            tools_on_followup: false,
        }
    }
}

impl SwitchConfig {
    /// Config with no fallback: every reply is accepted as is
    pub fn without_fallback(primary_model: impl Into<String>) -> Self {
        Self {
            primary_model: primary_model.into(),
            fallback: None,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_trims_slash() {
        let mut endpoint = EndpointConfig::default();
        assert_eq!(endpoint.completions_url(), "http://localhost:1234/v1/chat/completions");

        endpoint.base_url = "http://host:8080/v1/".to_string();
        assert_eq!(endpoint.completions_url(), "http://host:8080/v1/chat/completions");
    }

    #[test]
    fn test_default_switch_config() {
        let config = SwitchConfig::default();
        assert_eq!(config.primary_model, DEFAULT_MODEL);
        let fallback = config.fallback.unwrap();
        assert_eq!(fallback.model, FALLBACK_MODEL);
        assert_eq!(fallback.max_switches_per_turn, 1);
        assert!(fallback.max_empty_retries.is_none());
    }

    #[test]
    fn test_without_fallback() {
        let config = SwitchConfig::without_fallback("m");
        assert_eq!(config.primary_model, "m");
        assert!(config.fallback.is_none());
        assert_eq!(config.max_tool_rounds, MAX_TOOL_ROUNDS);
    }
}
