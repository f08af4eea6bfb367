//! Player roster: YAML sheets and the starting-player roll

use std::path::Path;

use rand::Rng;

use crate::error::{ChatError, Result};
use crate::types::{Player, PlayerRoster};

/// Written to disk when no roster exists yet
pub const PLAYER_TEMPLATE: &str = r#"players:
  - name: "Player1"
    alien_skill: "Telekinesis"
    mundane_skills: ["Lockpicking", "Stealth"]
    primary_goal: "Steal the artifact"
    secondary_goal: "Avoid detection"
    tertiary_goal: "Help the Homeward faction"
    faction: "Homeward"
  - name: "Player2"
    alien_skill: "Shape-shifting"
    mundane_skills: ["Persuasion", "Driving"]
    primary_goal: "Deliver the package"
    secondary_goal: "Gather intelligence"
    tertiary_goal: "Promote Earthbound interests"
    faction: "Earthbound"
"#;

/// Players read from disk, and whether the template had to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterLoad {
    pub players: Vec<Player>,
    pub created_template: bool,
}

/// Parse a roster document
pub fn parse_roster(yaml: &str) -> Result<Vec<Player>> {
    let roster: PlayerRoster = serde_yaml::from_str(yaml)?;
    Ok(roster.players)
}

/// Load `path`, writing the template there first if it does not exist
pub fn load_players(path: &Path) -> Result<RosterLoad> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "roster not found, writing template");
        std::fs::write(path, PLAYER_TEMPLATE)?;
        return Ok(RosterLoad {
            players: parse_roster(PLAYER_TEMPLATE)?,
            created_template: true,
        });
    }

    let yaml = std::fs::read_to_string(path)?;
    Ok(RosterLoad {
        players: parse_roster(&yaml)?,
        created_template: false,
    })
}

/// One d6 per player; the highest roll starts, the earliest player wins ties
pub fn determine_starting_player<R: Rng + ?Sized>(
    players: &[Player],
    rng: &mut R,
) -> Result<(String, Vec<(String, u8)>)> {
    let rolls: Vec<(String, u8)> = players
        .iter()
        .map(|p| (p.name.clone(), rng.gen_range(1..=6)))
        .collect();

    let mut best: Option<&(String, u8)> = None;
    for roll in &rolls {
        if best.map_or(true, |b| roll.1 > b.1) {
            best = Some(roll);
        }
    }

    let starter = best.map(|(name, _)| name.clone()).ok_or(ChatError::NoPlayers)?;
    Ok((starter, rolls))
}
