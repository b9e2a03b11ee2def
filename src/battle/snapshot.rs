//! Minimal persisted snapshot
//!
//! Captures everything that changes during play. The map layout, rules
//! and dice are supplied again on restore; the event log starts over.

use std::collections::BTreeSet;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::battle::abilities::AbilityState;
use crate::battle::battle_map::BattleMap;
use crate::battle::dice::Dice;
use crate::battle::execution::{GameState, Phase};
use crate::battle::hex::HexCoord;
use crate::battle::player::{Player, Side};
use crate::battle::ship_ops::WellDeckMode;
use crate::battle::unit_type::UnitType;
use crate::battle::units::{StatusFlag, Unit};
use crate::battle::victory::GameOutcome;
use crate::core::config::RulesConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{GameId, ObjectiveId, PlayerId, Turn, UnitId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSnapshot {
    pub id: UnitId,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub side: Side,
    pub position: HexCoord,
    #[serde(rename = "currentHP")]
    pub current_hp: u32,
    pub has_acted: bool,
    pub has_moved: bool,
    pub suppression_tokens: u8,
    pub hidden: bool,
    pub status_effects: Vec<StatusFlag>,
    pub cargo: Vec<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carried_by: Option<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply: Option<u32>,
    /// Omitted means the type's default abilities at full uses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<AbilityState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipSnapshot {
    pub hull: u32,
    pub ammo: u32,
    #[serde(default)]
    pub flight_launches: u32,
    #[serde(default)]
    pub well_launches: u32,
    #[serde(default)]
    pub well_mode: Option<WellDeckMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub side: Side,
    #[serde(default)]
    pub name: String,
    pub command_points: u32,
    pub units: Vec<UnitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship: Option<ShipSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveSnapshot {
    pub id: ObjectiveId,
    pub controller: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub turn: Turn,
    pub phase: Phase,
    pub active_player_id: PlayerId,
    pub is_game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
    pub players: Vec<PlayerSnapshot>,
    #[serde(default)]
    pub passed: Vec<PlayerId>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveSnapshot>,
    #[serde(default)]
    pub smoke: Vec<HexCoord>,
}

impl UnitSnapshot {
    fn capture(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            unit_type: unit.unit_type,
            side: unit.side,
            position: unit.position,
            current_hp: unit.hp,
            has_acted: unit.has_acted,
            has_moved: unit.has_moved,
            suppression_tokens: unit.suppression(),
            hidden: unit.is_hidden(),
            status_effects: unit.status().iter().copied().collect(),
            cargo: unit.cargo.clone(),
            carried_by: unit.carried_by,
            supply: unit.supply,
            abilities: unit.abilities.clone(),
        }
    }

    /// `carried_by` comes from the transports' cargo lists, not from this
    /// record.
    fn rebuild(&self, owner: PlayerId, carried_by: Option<UnitId>) -> Unit {
        let mut unit = Unit::new(self.id, self.unit_type, owner, self.position);
        unit.hp = self.current_hp.min(unit.stats.max_hp);
        unit.has_acted = self.has_acted;
        unit.has_moved = self.has_moved;
        unit.cargo = self.cargo.clone();
        if self.supply.is_some() {
            unit.supply = self.supply;
        }
        if !self.abilities.is_empty() {
            unit.abilities = self.abilities.clone();
        }
        if let Some(transport) = carried_by {
            unit.embark(transport, self.position);
        }

        let flags: BTreeSet<StatusFlag> = self.status_effects.iter().copied().collect();
        for flag in [
            StatusFlag::Hidden,
            StatusFlag::Decoy,
            StatusFlag::Entrenched,
            StatusFlag::FreshlyRevealed,
        ] {
            unit.set_flag(flag, flags.contains(&flag));
        }
        if self.hidden && !unit.is_hidden() {
            unit.hide();
        }
        unit.set_suppression(self.suppression_tokens);
        unit
    }
}

impl GameState {
    pub fn snapshot(&self) -> GameSnapshot {
        let players = self
            .players
            .values()
            .map(|p| PlayerSnapshot {
                id: p.id,
                side: p.side,
                name: p.name.clone(),
                command_points: p.command_points,
                units: p.units.values().map(UnitSnapshot::capture).collect(),
                ship: p.ship.as_ref().map(|ops| ShipSnapshot {
                    hull: ops.hull(),
                    ammo: ops.ammo,
                    flight_launches: ops.flight_launches,
                    well_launches: ops.well_launches,
                    well_mode: ops.well_mode,
                }),
            })
            .collect();

        GameSnapshot {
            game_id: self.id,
            turn: self.turn,
            phase: self.phase,
            active_player_id: self.active_player,
            is_game_over: self.game_over,
            winner: self.outcome.map(|o| o.winner),
            outcome: self.outcome,
            players,
            passed: self.passed.iter().copied().collect(),
            objectives: self
                .map
                .objectives()
                .map(|(_, o)| ObjectiveSnapshot {
                    id: o.id,
                    controller: o.controller,
                })
                .collect(),
            smoke: self.map.smoke().collect(),
        }
    }

    /// Rebuild a game from a snapshot and its externally authored map
    ///
    /// The usual consistency checks of `GameState::new` apply, so a
    /// snapshot with dangling cargo links or duplicate ids is refused.
    pub fn restore(
        snapshot: &GameSnapshot,
        mut map: BattleMap,
        config: RulesConfig,
        dice: Dice,
    ) -> Result<GameState> {
        for objective in &snapshot.objectives {
            map.set_objective_controller(objective.id, objective.controller)?;
        }
        for &coord in &snapshot.smoke {
            map.place_smoke(coord);
        }

        let players = snapshot
            .players
            .iter()
            .map(restore_player)
            .collect::<Result<Vec<_>>>()?;
        let mut state = GameState::new(map, players, config, dice)?;

        if !state.players.contains_key(&snapshot.active_player_id) {
            return Err(EngineError::PlayerNotFound(snapshot.active_player_id));
        }
        state.id = snapshot.game_id;
        state.turn = snapshot.turn;
        state.phase = snapshot.phase;
        state.active_player = snapshot.active_player_id;
        state.passed = snapshot.passed.iter().copied().collect();
        state.game_over = snapshot.is_game_over;
        state.outcome = snapshot.outcome;

        for saved in &snapshot.players {
            let player = state.require_player_mut(saved.id)?;
            if let (Some(ops), Some(ship)) = (player.ship.as_mut(), saved.ship.as_ref()) {
                ops.set_hull(ship.hull);
                ops.ammo = ship.ammo.min(ops.max_ammo);
                ops.flight_launches = ship.flight_launches;
                ops.well_launches = ship.well_launches;
                ops.well_mode = ship.well_mode;
            }
        }

        let turn = state.turn;
        for objective in &snapshot.objectives {
            for player in state.players.values_mut() {
                let held = objective.controller == Some(player.id);
                player.record_objective(objective.id, held, turn);
            }
        }

        state.refresh_visibility();
        info!(game = %state.id, turn = state.turn, phase = %state.phase, "game restored");
        Ok(state)
    }
}

fn restore_player(saved: &PlayerSnapshot) -> Result<Player> {
    let mut player = Player::new(saved.id, saved.side, saved.name.clone());
    player.command_points = saved.command_points;

    // Cargo lists are authoritative; a recorded carriedBy must agree
    let mut carriers: AHashMap<UnitId, UnitId> = AHashMap::new();
    for transport in &saved.units {
        for passenger in &transport.cargo {
            if let Some(other) = carriers.insert(*passenger, transport.id) {
                return Err(EngineError::InvalidScenario(format!(
                    "{} is listed as cargo of both {} and {}",
                    passenger, other, transport.id
                )));
            }
        }
    }
    for unit in &saved.units {
        let carried_by = carriers.get(&unit.id).copied();
        if unit.carried_by.is_some() && unit.carried_by != carried_by {
            return Err(EngineError::InvalidScenario(format!(
                "{} records carrier {:?} but is carried by {:?}",
                unit.id, unit.carried_by, carried_by
            )));
        }
        if unit.side != saved.side {
            return Err(EngineError::InvalidScenario(format!(
                "{} is recorded as {} but belongs to a {} player",
                unit.id, unit.side, saved.side
            )));
        }
        player.add_unit(unit.rebuild(saved.id, carried_by));
    }
    Ok(player)
}
