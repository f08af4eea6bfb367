//! Integration tests for game mode
//!
//! Tests the path: roster file → starting player → tool calls → counters

use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use tempfile::tempdir;

use lmswitch::core::game::{update_alien_exposure, update_chaos_counter, update_faction_slider};
use lmswitch::core::{load_players, GameMaster, ToolBox};
use lmswitch::types::{FactionDirection, Hostility, SessionCounters};

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn game() -> GameMaster {
    let dir = tempdir().unwrap();
    let roster = load_players(&dir.path().join("players.yaml")).unwrap();
    GameMaster::new(roster.players, Some(42))
}

/// Faction sequence: +5 fires Homeward and resets, the next +1 resumes from 0
#[test]
fn test_homeward_fires_once_then_resumes() {
    let mut gm = game();

    let fired = gm.call("update_faction_slider", &args(json!({"direction": "Homeward", "amount": 5})));
    assert_eq!(fired["event_triggered"], true);
    assert_eq!(fired["slider_value"], 0);

    let next = gm.call("update_faction_slider", &args(json!({"direction": "Homeward"})));
    assert_eq!(next["event_triggered"], false);
    assert_eq!(next["slider_value"], 1);
    assert_eq!(next["event_description"], "");
}

/// Overshooting still fires exactly once
#[test]
fn test_overshoot_clamps_then_fires() {
    let start = SessionCounters { faction_slider: 3, ..Default::default() };
    let (next, report) = update_faction_slider(start, FactionDirection::Homeward, 100);
    assert!(report.event_triggered);
    assert_eq!(next.faction_slider, 0);

    let (next, report) = update_faction_slider(next, FactionDirection::Earthbound, 100);
    assert!(report.event_triggered);
    assert!(report.event_description.starts_with("EARTHBOUND"));
    assert_eq!(next.faction_slider, 0);
}

/// Ten single increments: nine successes, then the breakdown
#[test]
fn test_ten_chaos_increments() {
    let mut counters = SessionCounters::default();
    for expected in 1..=9 {
        let (next, report) = update_chaos_counter(counters, 1);
        assert_eq!(serde_json::to_value(&report).unwrap()["counter_value"], expected);
        counters = next;
    }
    assert!(!counters.chaos_mode);

    let (counters, report) = update_chaos_counter(counters, 1);
    let report = serde_json::to_value(&report).unwrap();
    assert_eq!(report["status"], "chaos_breakdown");
    assert_eq!(report["message"], "CHAOTIC BREAKDOWN! The Jeff experiences a chaotic breakdown!");
    assert_eq!(counters.chaos_counter, 0);
    assert!(counters.chaos_mode);
}

/// Negative chaos never goes below zero
#[test]
fn test_chaos_floor() {
    let (counters, _) = update_chaos_counter(SessionCounters::default(), -5);
    assert_eq!(counters.chaos_counter, 0);
    assert!(!counters.chaos_mode);
}

#[test]
fn test_exposure_hostility_tiers() {
    let mut counters = SessionCounters::default();
    let mut tiers = Vec::new();
    for _ in 0..3 {
        let (next, report) = update_alien_exposure(counters, 3);
        tiers.push(report.human_hostility);
        counters = next;
    }
    assert_eq!(tiers, vec![Hostility::Moderate, Hostility::High, Hostility::Extreme]);
    assert_eq!(counters.alien_exposure, 9);
}

/// Bad tool input becomes an error result and leaves state alone
#[test]
fn test_bad_direction_is_an_error_result() {
    let mut gm = game();
    gm.call("update_chaos_counter", &args(json!({"amount": 3})));
    let before = gm.counters();

    for direction in [json!("homeward"), json!(""), json!(5)] {
        let result = gm.call("update_faction_slider", &args(json!({"direction": direction})));
        assert_eq!(result["status"], "error");
    }
    assert_eq!(gm.counters(), before);

    let unknown = gm.call("summon_ufo", &Map::new());
    assert_eq!(unknown["message"], "Unknown function: summon_ufo");
}

/// Seeded sessions roll the same starting player
#[test]
fn test_seeded_start_is_reproducible() {
    let mut a = game();
    let mut b = game();
    let rolls_a = a.choose_starting_player().unwrap();
    let rolls_b = b.choose_starting_player().unwrap();

    assert_eq!(rolls_a, rolls_b);
    assert_eq!(a.current_player(), b.current_player());
    assert!(rolls_a.iter().all(|(_, roll)| (1..=6).contains(roll)));

    let best = rolls_a.iter().map(|(_, r)| *r).max().unwrap();
    let first_best = rolls_a.iter().find(|(_, r)| *r == best).unwrap();
    assert_eq!(a.current_player(), Some(first_best.0.as_str()));
}

#[test]
fn test_tool_declarations() {
    let gm = game();
    let names: Vec<&str> = gm.declarations().iter().map(|d| d.name()).collect();
    assert_eq!(
        names,
        vec!["roll_d6", "update_faction_slider", "update_chaos_counter", "update_alien_exposure"]
    );
}
