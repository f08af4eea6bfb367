//! Session transcripts written on exit

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{ChatMessage, Conversation, SessionCounters, TurnOutcome};

/// Everything worth keeping from one chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub saved_at: DateTime<Utc>,
    /// "assistant" or "game"
    pub mode: String,
    /// Model active at exit
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub outcomes: Vec<TurnOutcome>,
    /// Final counters (game mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<SessionCounters>,
}

impl Transcript {
    pub fn new(mode: &str, model: &str, conversation: &Conversation, outcomes: Vec<TurnOutcome>) -> Self {
        Self {
            saved_at: Utc::now(),
            mode: mode.to_string(),
            model: model.to_string(),
            messages: conversation.messages().to_vec(),
            outcomes,
            counters: None,
        }
    }

    pub fn with_counters(mut self, counters: SessionCounters) -> Self {
        self.counters = Some(counters);
        self
    }

    /// `transcript_<UTC timestamp>.json`
    pub fn file_name(&self) -> String {
        format!("transcript_{}.json", self.saved_at.format("%Y%m%dT%H%M%S%.3fZ"))
    }
}

/// Save transcript as pretty JSON under `dir`, creating it if needed
pub fn save_transcript(transcript: &Transcript, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(transcript.file_name());
    let json = serde_json::to_string_pretty(transcript)?;

    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, json)?;

    tracing::info!(path = %path.display(), messages = transcript.messages.len(), "transcript saved");
    Ok(path)
}
