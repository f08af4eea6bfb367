//! Error type shared by the client, controller and game start-up

use thiserror::Error;

/// Everything that can end a turn or stop a session from starting
#[derive(Debug, Error)]
pub enum ChatError {
    /// Connection, timeout or body read failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-2xx status
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a chat completion
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Completion carried no choices
    #[error("response contained no choices")]
    EmptyChoices,

    /// Empty-reply recovery hit its configured cap
    #[error("model returned empty replies {0} times in a row")]
    EmptyRetriesExhausted(u32),

    /// Failure reported by a non-HTTP backend
    #[error("backend error: {0}")]
    Backend(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid player roster: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("player roster is empty")]
    NoPlayers,
}

pub type Result<T> = std::result::Result<T, ChatError>;
