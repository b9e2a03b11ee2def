//! Scenario files: rules, map layout and both orders of battle
//!
//! Scenarios are authored in TOML (or JSON) and turned into a ready
//! `GameState` at turn 1. Units may start embarked by naming the
//! transport they ride in.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::battle::battle_map::{BattleMap, MapLayout};
use crate::battle::dice::Dice;
use crate::battle::execution::GameState;
use crate::battle::hex::HexCoord;
use crate::battle::player::{Player, Side};
use crate::battle::unit_type::UnitType;
use crate::battle::units::Unit;
use crate::core::config::RulesConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{PlayerId, UnitId};

/// One unit placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: UnitId,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    /// Starting hex; omitted for units that start aboard a transport
    #[serde(default)]
    pub at: Option<HexCoord>,
    #[serde(default)]
    pub aboard: Option<UnitId>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub id: PlayerId,
    pub side: Side,
    pub name: String,
    #[serde(default)]
    pub command_points: u32,
    #[serde(default)]
    pub units: Vec<Deployment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Dice seed used by `build_seeded`
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub rules: RulesConfig,
    pub map: MapLayout,
    pub players: Vec<PlayerSetup>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load by extension: `.json` is JSON, anything else TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Game at turn 1 with dice seeded from the scenario (0 if unset)
    pub fn build_seeded(&self) -> Result<GameState> {
        self.build(Dice::seeded(self.seed.unwrap_or(0)))
    }

    pub fn build(&self, dice: Dice) -> Result<GameState> {
        let map = BattleMap::from_layout(&self.map)?;
        let players = self
            .players
            .iter()
            .map(build_player)
            .collect::<Result<Vec<_>>>()?;
        let state = GameState::new(map, players, self.rules.clone(), dice)?;
        info!(scenario = %self.name, units = state.units().count(), "scenario loaded");
        Ok(state)
    }
}

fn build_player(setup: &PlayerSetup) -> Result<Player> {
    let mut player = Player::new(setup.id, setup.side, setup.name.clone());
    player.command_points = setup.command_points;

    for deployment in &setup.units {
        let position = match (deployment.at, deployment.aboard) {
            (Some(at), None) => at,
            (None, Some(_)) => HexCoord::ORIGIN,
            (Some(_), Some(_)) => {
                return Err(EngineError::InvalidScenario(format!(
                    "{} has both a position and a transport",
                    deployment.id
                )))
            }
            (None, None) => {
                return Err(EngineError::InvalidScenario(format!(
                    "{} needs a position or a transport",
                    deployment.id
                )))
            }
        };
        if player.unit(deployment.id).is_some() {
            return Err(EngineError::InvalidScenario(format!(
                "{} deployed twice",
                deployment.id
            )));
        }
        let mut unit = Unit::new(deployment.id, deployment.unit_type, setup.id, position);
        if deployment.hidden {
            unit.hide();
        }
        player.add_unit(unit);
    }

    embark_passengers(&mut player, &setup.units)?;
    Ok(player)
}

/// Link passengers to transports and move them to the transport's hex
fn embark_passengers(player: &mut Player, deployments: &[Deployment]) -> Result<()> {
    let links: BTreeMap<UnitId, UnitId> = deployments
        .iter()
        .filter_map(|d| d.aboard.map(|t| (d.id, t)))
        .collect();

    for (&passenger, &transport) in &links {
        let carrier = player.unit_mut(transport).ok_or_else(|| {
            EngineError::InvalidScenario(format!(
                "{} boards {}, which this player does not field",
                passenger, transport
            ))
        })?;
        carrier.cargo.push(passenger);
        let unit = unit_in(player, passenger)?;
        unit.embark(transport, HexCoord::ORIGIN);
    }

    // Resolve positions down each cargo chain
    for &passenger in links.keys() {
        let mut root = passenger;
        let mut hops = 0;
        while let Some(&next) = links.get(&root) {
            root = next;
            hops += 1;
            if hops > links.len() {
                return Err(EngineError::InvalidScenario(format!(
                    "{} is part of a cargo cycle",
                    passenger
                )));
            }
        }
        let position = unit_in(player, root)?.position;
        unit_in(player, passenger)?.position = position;
    }
    Ok(())
}

fn unit_in(player: &mut Player, id: UnitId) -> Result<&mut Unit> {
    player.unit_mut(id).ok_or(EngineError::UnitNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::execution::Phase;

    const SMALL: &str = r#"
name = "Landing drill"
seed = 11

[rules]
turn_limit = 6

[map.shape]
kind = "parallelogram"
width = 8
height = 6

[[map.cells]]
at = { q = 0, r = 2 }
terrain = "DeepWater"

[[map.objectives]]
id = 1
at = { q = 6, r = 2 }
name = "Radio mast"

[[players]]
id = 1
side = "assault"
name = "Task Force"

[[players.units]]
id = 1
type = "AssaultShip"
at = { q = 0, r = 2 }

[[players.units]]
id = 2
type = "AmphibiousVehicle"
aboard = 1

[[players.units]]
id = 3
type = "MarineSquad"
aboard = 2

[[players]]
id = 2
side = "defense"
name = "Garrison"

[[players.units]]
id = 10
type = "InfantrySquad"
at = { q = 6, r = 3 }
hidden = true
"#;

    #[test]
    fn test_loads_nested_cargo() {
        let scenario = Scenario::from_toml_str(SMALL).unwrap();
        let state = scenario.build_seeded().unwrap();
        assert_eq!(state.phase, Phase::Event);
        assert_eq!(state.config.turn_limit, 6);

        let ship = state.unit(UnitId(1)).unwrap();
        assert_eq!(ship.cargo, vec![UnitId(2)]);
        let marines = state.unit(UnitId(3)).unwrap();
        assert_eq!(marines.carried_by, Some(UnitId(2)));
        assert_eq!(marines.position, HexCoord::new(0, 2));
        assert!(state.unit(UnitId(10)).unwrap().is_hidden());
    }

    #[test]
    fn test_rejects_unknown_transport() {
        let broken = SMALL.replace("aboard = 2", "aboard = 99");
        let scenario = Scenario::from_toml_str(&broken).unwrap();
        assert!(matches!(
            scenario.build_seeded(),
            Err(EngineError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_rejects_incompatible_cargo() {
        // a marine squad cannot carry anyone
        let broken = SMALL.replace("aboard = 2", "aboard = 1").replace(
            "type = \"AmphibiousVehicle\"\naboard = 1",
            "type = \"AmphibiousVehicle\"\naboard = 3",
        );
        let scenario = Scenario::from_toml_str(&broken).unwrap();
        assert!(scenario.build_seeded().is_err());
    }

    #[test]
    fn test_deployment_needs_a_place() {
        let broken = SMALL.replace("at = { q = 6, r = 3 }\n", "");
        let scenario = Scenario::from_toml_str(&broken).unwrap();
        assert!(matches!(
            scenario.build_seeded(),
            Err(EngineError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_json_round_trip_shape() {
        let scenario = Scenario::from_toml_str(SMALL).unwrap();
        let json = serde_json::to_string(&scenario).unwrap();
        let back = Scenario::from_json_str(&json).unwrap();
        assert_eq!(back, scenario);
    }
}
