//! Core types for lmswitch

mod message;
mod tool;
mod phase;
mod reason;
mod outcome;
mod conversation;
mod game;

pub use message::{Role, FunctionCall, ToolCall, ChatMessage, AssistantReply, ChatRequest, ChatCompletion, Choice};
pub use tool::{ToolDefinition, FunctionDefinition, error_result, unknown_tool};
pub use phase::TurnPhase;
pub use reason::ReasonCode;
pub use outcome::{TurnOutcome, Transition};
pub use conversation::{Conversation, TurnSnapshot};
pub use game::{SessionCounters, FactionDirection, Hostility, ExtremeEvent, CounterUpdate, Player, PlayerRoster};
