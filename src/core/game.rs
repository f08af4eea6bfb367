//! Game Master for "The Jeff"
//!
//! Counter updates are pure: `(counters, args) -> (counters, report)`.
//! `GameMaster` owns the current counters, the roster and the dice, and
//! exposes the four game tools to the turn controller.
//!
//! Counter rules:
//! - faction slider: clamp to [-5, 5]; hitting either end fires an extreme
//!   event and resets to 0
//! - chaos counter: clamp to [0, 10]; hitting 10 fires a breakdown, resets
//!   to 0 and turns on chaos mode
//! - alien exposure: floor at 0, no ceiling

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::core::players::determine_starting_player;
use crate::core::toolbox::{int_arg, str_arg, ToolBox};
use crate::error::Result;
use crate::types::{
    error_result, unknown_tool, CounterUpdate, ExtremeEvent, FactionDirection, Hostility,
    Player, SessionCounters, ToolDefinition,
};
use crate::{CHAOS_MAX, CHAOS_MIN, COUNTER_REST, FACTION_MAX, FACTION_MIN};

/// Phrase in a GM reply that ends chaos mode
pub const CHAOS_RESOLVED_PHRASE: &str = "chaos breakdown resolved";

/// Hidden user prompt that asks for the opening narration
pub const OPENING_PROMPT: &str = "Begin the game.";

// =============================================================================
// PURE COUNTER UPDATES
// =============================================================================

/// Add then clamp, without overflow
pub fn apply_bounded(old: i32, delta: i32, min: i32, max: i32) -> i32 {
    old.saturating_add(delta).clamp(min, max)
}

/// Clamp, then fire `on_min`/`on_max` if the value landed on that bound
///
/// A fired event resets the value to rest, so holding at the bound cannot
/// fire twice.
pub fn bounded_update(
    old: i32,
    delta: i32,
    (min, max): (i32, i32),
    on_min: Option<ExtremeEvent>,
    on_max: Option<ExtremeEvent>,
) -> CounterUpdate {
    let value = apply_bounded(old, delta, min, max);
    let event = if value == max {
        on_max
    } else if value == min {
        on_min
    } else {
        None
    };
    match event {
        Some(event) => CounterUpdate { value: COUNTER_REST, event: Some(event) },
        None => CounterUpdate { value, event: None },
    }
}

/// Result of `update_faction_slider`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionReport {
    pub status: &'static str,
    pub slider_value: i32,
    pub event_triggered: bool,
    pub event_description: String,
}

/// Result of `update_chaos_counter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChaosReport {
    Success { counter_value: i32 },
    ChaosBreakdown { message: String, counter_reset: bool },
}

/// Result of `update_alien_exposure`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposureReport {
    pub status: &'static str,
    pub exposure_level: i32,
    pub human_hostility: Hostility,
}

/// Result of `roll_d6`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceRoll {
    pub status: &'static str,
    pub roll: u8,
    pub description: String,
}

pub fn update_faction_slider(
    counters: SessionCounters,
    direction: FactionDirection,
    amount: i32,
) -> (SessionCounters, FactionReport) {
    let update = bounded_update(
        counters.faction_slider,
        direction.signed(amount),
        (FACTION_MIN, FACTION_MAX),
        Some(ExtremeEvent::Earthbound),
        Some(ExtremeEvent::Homeward),
    );
    let next = SessionCounters { faction_slider: update.value, ..counters };
    let report = FactionReport {
        status: "success",
        slider_value: update.value,
        event_triggered: update.fired(),
        event_description: update.event_text().to_string(),
    };
    (next, report)
}

pub fn update_chaos_counter(counters: SessionCounters, amount: i32) -> (SessionCounters, ChaosReport) {
    let update = bounded_update(
        counters.chaos_counter,
        amount,
        (CHAOS_MIN, CHAOS_MAX),
        None,
        Some(ExtremeEvent::ChaoticBreakdown),
    );
    let next = SessionCounters {
        chaos_counter: update.value,
        chaos_mode: counters.chaos_mode || update.fired(),
        ..counters
    };
    let report = match update.event {
        Some(event) => ChaosReport::ChaosBreakdown {
            message: event.description().to_string(),
            counter_reset: true,
        },
        None => ChaosReport::Success { counter_value: update.value },
    };
    (next, report)
}

pub fn update_alien_exposure(counters: SessionCounters, amount: i32) -> (SessionCounters, ExposureReport) {
    let exposure = counters.alien_exposure.saturating_add(amount).max(0);
    let next = SessionCounters { alien_exposure: exposure, ..counters };
    let report = ExposureReport {
        status: "success",
        exposure_level: exposure,
        human_hostility: next.hostility(),
    };
    (next, report)
}

pub fn roll_d6<R: Rng + ?Sized>(rng: &mut R) -> DiceRoll {
    let roll: u8 = rng.gen_range(1..=6);
    DiceRoll {
        status: "success",
        roll,
        description: format!("D6 roll result: {}", roll),
    }
}

// =============================================================================
// GAME MASTER
// =============================================================================

/// Session state for game mode plus the tools that mutate it
#[derive(Debug)]
pub struct GameMaster {
    counters: SessionCounters,
    /// Counters as they stood when the current turn began
    checkpoint: SessionCounters,
    players: Vec<Player>,
    current_player: Option<String>,
    opening_done: bool,
    rng: StdRng,
    declarations: Vec<ToolDefinition>,
}

impl GameMaster {
    /// Fresh session; `seed` makes dice reproducible
    pub fn new(players: Vec<Player>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            counters: SessionCounters::default(),
            checkpoint: SessionCounters::default(),
            players,
            current_player: None,
            opening_done: false,
            rng,
            declarations: declarations(),
        }
    }

    /// Roll for the starting player and remember who it is
    pub fn choose_starting_player(&mut self) -> Result<Vec<(String, u8)>> {
        let (starter, rolls) = determine_starting_player(&self.players, &mut self.rng)?;
        tracing::info!(starter = %starter, "starting player chosen");
        self.current_player = Some(starter);
        Ok(rolls)
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_player(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    pub fn opening_done(&self) -> bool {
        self.opening_done
    }

    /// Opening narration has been delivered; prompts switch to the game loop
    pub fn mark_opening_done(&mut self) {
        self.opening_done = true;
    }

    /// React to an accepted GM reply; returns true if chaos mode just ended
    pub fn observe_reply(&mut self, reply: &str) -> bool {
        if self.counters.chaos_mode && reply.to_lowercase().contains(CHAOS_RESOLVED_PHRASE) {
            self.counters.chaos_mode = false;
            tracing::info!("chaos mode deactivated");
            return true;
        }
        false
    }

    /// Base block plus the block for the current mode
    pub fn system_prompt(&self) -> String {
        let c = self.counters;
        let base = format!(
            "You are the Game Master for \"The Jeff\" - a game where players control an alien entity.\n\n\
             Current Game State:\n\
             - Faction Alignment: {} (-5=Earthbound, 5=Homeward)\n\
             - Chaos Counter: {}/10\n\
             - Alien Exposure: {} (Human Hostility: {})\n\
             - Current Player: {}\n",
            c.faction_slider,
            c.chaos_counter,
            c.alien_exposure,
            c.hostility(),
            self.current_player.as_deref().unwrap_or("None"),
        );

        let mode = if c.chaos_mode {
            "\nCHAOS MODE ACTIVE: The Jeff is experiencing a chaotic breakdown!\n\
             Narrate erratic behavior that forces The Jeff to flee, change the status quo,\n\
             seed chaos, up the stakes, or create comedic situations. After this event,\n\
             chaos mode will end and the counter will reset. When the breakdown is over,\n\
             say \"chaos breakdown resolved\".\n"
        } else if !self.opening_done {
            "\nGAME START: Describe The Jeff's current situation, environment, and basic information.\n\
             Introduce the setting as a tightly packed playground (busy street, shopping center,\n\
             small festival, etc.) with multiple paths to achieve goals. Include events and\n\
             distractions (parade, TV filming, protest) and NPCs with their own goals and movement\n\
             patterns (vendor packing up, patrolling guard, mayor giving speech).\n"
        } else {
            "\nGAME LOOP: Narrate the current situation based on player actions. Remember:\n\
             - Keep the world small and immediate\n\
             - Create multiple paths to achieve goals\n\
             - Overlap player goals when possible\n\
             - Include dynamic events and NPCs\n\
             - For simple actions (walking, talking) no roll is needed\n\
             - For complex actions, call roll_d6 tool\n\
             - After failed actions or completed goals, request bidding for next player\n"
        };

        base + mode
    }

    /// Hidden player sheets for the GM
    pub fn player_secrets(&self) -> String {
        let mut secrets = String::from("PLAYER SECRETS (GM ONLY):\n");
        for p in &self.players {
            secrets.push_str(&format!(
                "\n{}:\n- Alien Skill: {}\n- Mundane Skills: {}\n- Goals: {} > {} > {}\n- Faction: {}\n",
                p.name,
                p.alien_skill,
                p.mundane_skills.join(", "),
                p.primary_goal,
                p.secondary_goal,
                p.tertiary_goal,
                p.faction,
            ));
        }
        secrets
    }

    /// System message content: prompt for current state + player secrets
    pub fn full_prompt(&self) -> String {
        format!("{}\n\n{}", self.system_prompt(), self.player_secrets())
    }

    /// One-line state summary shown after each GM reply
    pub fn state_line(&self) -> String {
        let c = self.counters;
        format!(
            "[GAME STATE] Faction: {} | Chaos: {}/10 | Exposure: {}",
            c.faction_slider, c.chaos_counter, c.alien_exposure
        )
    }
}

impl ToolBox for GameMaster {
    fn declarations(&self) -> &[ToolDefinition] {
        &self.declarations
    }

    fn call(&mut self, name: &str, args: &Map<String, Value>) -> Value {
        let result = match name {
            "roll_d6" => to_value(roll_d6(&mut self.rng)),
            "update_faction_slider" => {
                let raw = str_arg(args, "direction").unwrap_or("");
                match raw.parse::<FactionDirection>() {
                    Ok(direction) => {
                        let (next, report) =
                            update_faction_slider(self.counters, direction, int_arg(args, "amount", 1));
                        self.counters = next;
                        to_value(report)
                    }
                    Err(_) => error_result("Invalid faction direction"),
                }
            }
            "update_chaos_counter" => {
                let (next, report) = update_chaos_counter(self.counters, int_arg(args, "amount", 1));
                self.counters = next;
                to_value(report)
            }
            "update_alien_exposure" => {
                let (next, report) = update_alien_exposure(self.counters, int_arg(args, "amount", 1));
                self.counters = next;
                to_value(report)
            }
            other => {
                tracing::warn!(tool = other, "model called an unknown tool");
                unknown_tool(other)
            }
        };
        tracing::debug!(tool = name, counters = ?self.counters, "game tool finished");
        result
    }

    fn checkpoint(&mut self) {
        self.checkpoint = self.counters;
    }

    fn rollback(&mut self) {
        if self.counters != self.checkpoint {
            tracing::debug!(from = ?self.counters, to = ?self.checkpoint, "rolling back game counters");
        }
        self.counters = self.checkpoint;
    }
}

fn to_value<T: Serialize>(report: T) -> Value {
    serde_json::to_value(report).unwrap_or_else(|e| error_result(e.to_string()))
}

fn declarations() -> Vec<ToolDefinition> {
    let amount = |description: &str| {
        json!({
            "type": "object",
            "properties": {
                "amount": {"type": "integer", "description": description, "default": 1}
            },
            "required": []
        })
    };

    vec![
        ToolDefinition::no_args("roll_d6", "Roll a six-sided die for action resolution"),
        ToolDefinition::function(
            "update_faction_slider",
            "Adjust faction alignment slider and check for extreme events",
            json!({
                "type": "object",
                "properties": {
                    "direction": {
                        "type": "string",
                        "enum": ["Homeward", "Earthbound"],
                        "description": "Direction to move the slider"
                    },
                    "amount": {
                        "type": "integer",
                        "description": "Amount to move slider (default 1)",
                        "default": 1
                    }
                },
                "required": ["direction"]
            }),
        ),
        ToolDefinition::function(
            "update_chaos_counter",
            "Adjust chaos counter and check for breakdown event",
            amount("Amount to increase counter (default 1)"),
        ),
        ToolDefinition::function(
            "update_alien_exposure",
            "Increase alien exposure level",
            amount("Amount to increase exposure (default 1)"),
        ),
    ]
}

// =============================================================================
// TESTS
// =============================================================================
