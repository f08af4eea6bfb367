//! Game-mode state: session counters, events, player sheets

use serde::{Deserialize, Serialize};

/// Bounded counters for one game session
///
/// `Copy` on purpose: updates take the old value and hand back a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    /// -5 (Earthbound) ..= 5 (Homeward)
    pub faction_slider: i32,
    /// 0 ..= 10
    pub chaos_counter: i32,
    /// 0 ..
    pub alien_exposure: i32,
    /// Set by a chaotic breakdown, cleared once the GM resolves it
    pub chaos_mode: bool,
}

impl SessionCounters {
    pub fn hostility(&self) -> Hostility {
        Hostility::from_exposure(self.alien_exposure)
    }
}

/// Which way the faction slider moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactionDirection {
    Homeward,
    Earthbound,
}

impl FactionDirection {
    /// Signed slider delta for `amount`
    pub fn signed(&self, amount: i32) -> i32 {
        match self {
            FactionDirection::Homeward => amount,
            FactionDirection::Earthbound => amount.saturating_neg(),
        }
    }
}

impl std::str::FromStr for FactionDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Homeward" => Ok(FactionDirection::Homeward),
            "Earthbound" => Ok(FactionDirection::Earthbound),
            other => Err(format!("Invalid faction direction: {}", other)),
        }
    }
}

/// Human reaction to the alien, derived from exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hostility {
    Minimal,
    Moderate,
    High,
    Extreme,
}

impl Hostility {
    pub fn from_exposure(exposure: i32) -> Self {
        match exposure {
            e if e < 3 => Hostility::Minimal,
            e if e < 6 => Hostility::Moderate,
            e if e < 9 => Hostility::High,
            _ => Hostility::Extreme,
        }
    }
}

impl std::fmt::Display for Hostility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Hostility::Minimal => "Minimal",
            Hostility::Moderate => "Moderate",
            Hostility::High => "High",
            Hostility::Extreme => "Extreme",
        };
        write!(f, "{}", name)
    }
}

/// One-shot narrative event fired when a counter hits a bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremeEvent {
    Homeward,
    Earthbound,
    ChaoticBreakdown,
}

impl ExtremeEvent {
    pub fn description(&self) -> &'static str {
        match self {
            ExtremeEvent::Homeward => "HOMEWARD EXTREME EVENT: The Homeward faction's goal is significantly advanced through a complex situation!",
            ExtremeEvent::Earthbound => "EARTHBOUND EXTREME EVENT: Alien Exposure is dramatically reduced through a decisive action!",
            ExtremeEvent::ChaoticBreakdown => "CHAOTIC BREAKDOWN! The Jeff experiences a chaotic breakdown!",
        }
    }
}

/// New counter value plus the event it fired, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
    pub value: i32,
    pub event: Option<ExtremeEvent>,
}

impl CounterUpdate {
    pub fn fired(&self) -> bool {
        self.event.is_some()
    }

    pub fn event_text(&self) -> &'static str {
        self.event.map(|e| e.description()).unwrap_or("")
    }
}

/// A player's secret sheet, read from the roster file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub alien_skill: String,
    #[serde(default)]
    pub mundane_skills: Vec<String>,
    pub primary_goal: String,
    pub secondary_goal: String,
    pub tertiary_goal: String,
    pub faction: String,
}

/// Top-level shape of `players.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRoster {
    #[serde(default)]
    pub players: Vec<Player>,
}
