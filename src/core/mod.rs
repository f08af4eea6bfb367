//! Core modules for lmswitch

pub mod policy;
pub mod client;
pub mod toolbox;
pub mod controller;
pub mod assistant;
pub mod players;
pub mod game;
pub mod transcript;

pub use policy::SwitchPolicy;
pub use client::{ChatBackend, LmStudioClient};
pub use toolbox::{NoTools, ToolBox};
pub use controller::{SwitchConfirm, TurnController};
pub use assistant::{AssistantTools, UrlOpener};
pub use players::{determine_starting_player, load_players, parse_roster, RosterLoad};
pub use game::{GameMaster, OPENING_PROMPT};
pub use transcript::{save_transcript, Transcript};
