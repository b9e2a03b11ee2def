//! Game state: the aggregate root of a battle
//!
//! Owns the map, both players (and through them every unit), the
//! visibility system, the rules and the dice. The phase machine and the
//! append-only event log live here; action handlers are in `handlers`,
//! `engagement` and `abilities`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::SUPPRESSION_RECOVERY_PER_TURN;
use crate::battle::dice::Dice;
use crate::battle::hex::HexCoord;
use crate::battle::player::{Player, Side};
use crate::battle::ship_ops::{ShipOperations, ShipStatus};
use crate::battle::unit_type::Capability;
use crate::battle::units::Unit;
use crate::battle::victory::{self, GameOutcome};
use crate::battle::visibility::{clear_line, unit_blockers, LastKnown, VisibilitySystem};
use crate::core::config::RulesConfig;
use crate::core::error::{EngineError, Result, RuleViolation};
use crate::core::types::{GameId, PlayerId, Turn, UnitId};

/// Phases of a turn, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Event,
    Command,
    Deployment,
    Movement,
    Action,
    End,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Event,
        Phase::Command,
        Phase::Deployment,
        Phase::Movement,
        Phase::Action,
        Phase::End,
    ];

    /// Next phase; End wraps to Event
    pub fn next(&self) -> Phase {
        match self {
            Phase::Event => Phase::Command,
            Phase::Command => Phase::Deployment,
            Phase::Deployment => Phase::Movement,
            Phase::Movement => Phase::Action,
            Phase::Action => Phase::End,
            Phase::End => Phase::Event,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Types of game events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    GameStarted,
    TurnStarted,
    PhaseChanged,
    ControlPassed,
    CommandPointsGenerated,
    UnitMoved,
    UnitAttacked,
    UnitDestroyed,
    UnitRevealed,
    DecoyExposed,
    UnitLoaded,
    UnitUnloaded,
    UnitLaunched,
    UnitRecovered,
    ObjectiveSecured,
    AbilityUsed,
    PointDefenseFired,
    InterceptFired,
    Resupplied,
    ShipStatusChanged,
    GameOver,
}

/// Immutable record of one state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub turn: Turn,
    pub phase: Phase,
    /// Logical sequence number, strictly increasing within a game
    pub timestamp: u64,
    pub event_type: EventType,
    pub description: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipSummary {
    pub hull: u32,
    pub max_hull: u32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub status: ShipStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub side: Side,
    pub name: String,
    pub command_points: u32,
    pub total_units: u32,
    pub living_units: u32,
    pub active_units: u32,
    pub objectives_secured: u32,
    pub ship: Option<ShipSummary>,
}

/// Read-only projection for presentation collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub turn: Turn,
    pub phase: Phase,
    pub active_player: PlayerId,
    pub game_over: bool,
    pub outcome: Option<GameOutcome>,
    pub players: Vec<PlayerSummary>,
    pub event_count: usize,
}

/// Full battle state
///
/// `Clone` is a deep copy: units, players, map and dice are all owned
/// values, so a clone can be mutated freely for look-ahead.
#[derive(Debug, Clone)]
pub struct GameState {
    pub id: GameId,
    pub turn: Turn,
    pub phase: Phase,
    pub active_player: PlayerId,
    /// Players that ended the current phase
    pub passed: BTreeSet<PlayerId>,
    pub game_over: bool,
    pub outcome: Option<GameOutcome>,
    pub map: BattleMap,
    pub players: BTreeMap<PlayerId, Player>,
    pub visibility: VisibilitySystem,
    pub config: RulesConfig,
    pub dice: Dice,
    events: Vec<GameEvent>,
    next_timestamp: u64,
}

impl GameState {
    /// Assemble a game at turn 1, Event phase
    ///
    /// Requires exactly one player per side, unique unit ids, units on the
    /// map (or consistently embarked) and a valid config.
    pub fn new(map: BattleMap, players: Vec<Player>, config: RulesConfig, dice: Dice) -> Result<Self> {
        config.validate()?;
        let players = validate_players(&map, players)?;

        let initiative = players
            .values()
            .find(|p| p.side == config.initiative)
            .map(|p| p.id)
            .ok_or_else(|| EngineError::InvalidScenario("initiative side has no player".into()))?;

        let mut state = Self {
            id: GameId::new(),
            turn: 1,
            phase: Phase::Event,
            active_player: initiative,
            passed: BTreeSet::new(),
            game_over: false,
            outcome: None,
            map,
            players,
            visibility: VisibilitySystem::new(),
            config,
            dice,
            events: Vec::new(),
            next_timestamp: 0,
        };

        state.attach_ship_operations()?;
        state.track_objectives();
        state.refresh_visibility();
        state.record(
            EventType::GameStarted,
            format!("Game {} started", state.id),
            json!({ "active_player": state.active_player }),
        );
        info!(game = %state.id, "game started");
        Ok(state)
    }

    fn attach_ship_operations(&mut self) -> Result<()> {
        let starting = self.config.starting_ammo;
        let max = self.config.max_ammo;
        for player in self.players.values_mut() {
            let bases: Vec<(UnitId, u32, u32)> = player
                .units
                .values()
                .filter(|u| u.profile().has(Capability::MobileBase))
                .map(|u| (u.id, u.stats.max_hp, u.hp))
                .collect();
            if bases.len() > 1 {
                return Err(EngineError::InvalidScenario(format!(
                    "{} fields more than one mobile base",
                    player.id
                )));
            }
            if let Some(&(id, max_hull, hull)) = bases.first() {
                if player.ship.as_ref().map(|s| s.ship_id) != Some(id) {
                    let mut ops = ShipOperations::new(id, max_hull, starting, max);
                    ops.set_hull(hull);
                    player.ship = Some(ops);
                }
            }
        }
        Ok(())
    }

    fn track_objectives(&mut self) {
        let objectives: Vec<_> = self
            .map
            .objectives()
            .map(|(_, o)| (o.id, o.kind, o.controller))
            .collect();
        for player in self.players.values_mut() {
            for (id, kind, controller) in &objectives {
                player.track_objective(*id, *kind);
                if *controller == Some(player.id) {
                    player.record_objective(*id, true, 1);
                }
            }
        }
    }

    // === EVENT LOG ===

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Append an event stamped with the current turn and phase
    pub fn record(&mut self, event_type: EventType, description: impl Into<String>, data: Value) {
        let event = GameEvent {
            turn: self.turn,
            phase: self.phase,
            timestamp: self.next_timestamp,
            event_type,
            description: description.into(),
            data,
        };
        self.next_timestamp += 1;
        debug!(turn = event.turn, phase = %event.phase, kind = ?event.event_type, "{}", event.description);
        self.events.push(event);
    }

    // === PLAYER QUERIES ===

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn require_player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(&id).ok_or(EngineError::PlayerNotFound(id))
    }

    pub fn require_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players.get_mut(&id).ok_or(EngineError::PlayerNotFound(id))
    }

    pub fn player_by_side(&self, side: Side) -> Option<&Player> {
        self.players.values().find(|p| p.side == side)
    }

    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        let side = self.player(id)?.side;
        self.player_by_side(side.opponent()).map(|p| p.id)
    }

    pub fn initiative_player(&self) -> Option<PlayerId> {
        self.player_by_side(self.config.initiative).map(|p| p.id)
    }

    // === UNIT QUERIES ===

    /// Any unit by id, destroyed or not
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.players.values().find_map(|p| p.unit(id))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.players.values_mut().find_map(|p| p.unit_mut(id))
    }

    /// Lookup for ids the engine itself holds (cargo links, ship ids)
    pub fn require_unit(&self, id: UnitId) -> Result<&Unit> {
        self.unit(id).ok_or(EngineError::UnitNotFound(id))
    }

    pub fn require_unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.unit_mut(id).ok_or(EngineError::UnitNotFound(id))
    }

    /// Lookup for ids a player submitted: unknown or foreign units are
    /// rule violations, not engine errors
    pub fn owned_unit(&self, player: PlayerId, id: UnitId) -> std::result::Result<&Unit, RuleViolation> {
        let unit = self.unit(id).ok_or(RuleViolation::UnknownUnit(id))?;
        if unit.owner != player {
            return Err(RuleViolation::NotOwner { unit: id, player });
        }
        Ok(unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.players.values().flat_map(|p| p.units.values())
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units().filter(|u| u.is_alive())
    }

    /// Living units standing on a hex (embarked units excluded)
    pub fn units_at(&self, coord: HexCoord) -> impl Iterator<Item = &Unit> + '_ {
        self.living_units()
            .filter(move |u| !u.is_embarked() && u.position == coord)
    }

    pub fn unit_at(&self, coord: HexCoord) -> Option<&Unit> {
        self.units_at(coord).next()
    }

    pub fn is_occupied(&self, coord: HexCoord) -> bool {
        self.unit_at(coord).is_some()
    }

    /// A living enemy combat unit of `side` stands within `distance`
    pub fn enemy_combatant_near(&self, side: Side, coord: HexCoord, distance: u32) -> bool {
        self.living_units().any(|u| {
            u.side != side
                && !u.is_embarked()
                && u.profile().is_combatant()
                && u.position.distance(&coord) <= distance
        })
    }

    /// Two distinct units, mutably
    pub fn pair_mut(&mut self, a: UnitId, b: UnitId) -> Option<(&mut Unit, &mut Unit)> {
        if a == b {
            return None;
        }
        let mut first = None;
        let mut second = None;
        for player in self.players.values_mut() {
            for (id, unit) in player.units.iter_mut() {
                if *id == a {
                    first = Some(unit);
                } else if *id == b {
                    second = Some(unit);
                }
            }
        }
        Some((first?, second?))
    }

    /// Mobile base unit of a player, if it fields one
    pub fn mobile_base(&self, player: PlayerId) -> Option<&Unit> {
        let ops = self.player(player)?.ship.as_ref()?;
        self.unit(ops.ship_id)
    }

    // === SIGHT ===

    /// Hexes whose occupants block sight
    pub fn unit_blockers(&self) -> AHashSet<HexCoord> {
        unit_blockers(self.players.values())
    }

    pub fn line_of_sight(&self, from: HexCoord, to: HexCoord) -> bool {
        clear_line(&self.map, &self.unit_blockers(), from, to)
    }

    pub fn refresh_visibility(&mut self) {
        self.visibility.recompute(&self.map, &self.players, self.turn);
    }

    pub fn visible_units(&self, player: PlayerId) -> Option<&BTreeSet<UnitId>> {
        self.visibility.record(player).map(|r| &r.visible_units)
    }

    pub fn explored_hexes(&self, player: PlayerId) -> Option<&BTreeSet<HexCoord>> {
        self.visibility.record(player).map(|r| &r.explored)
    }

    pub fn last_known(&self, player: PlayerId) -> Option<&BTreeMap<UnitId, LastKnown>> {
        self.visibility.record(player).map(|r| &r.last_known)
    }

    /// Strip concealment from a unit and refresh visibility. An exposed
    /// decoy marker is destroyed. Returns whether the unit was hidden.
    pub fn force_reveal(&mut self, id: UnitId) -> Result<bool> {
        let unit = self.require_unit_mut(id)?;
        if !unit.is_hidden() {
            return Ok(false);
        }
        unit.reveal();
        let position = unit.position;

        if unit.is_decoy() {
            unit.destroy();
            self.record(
                EventType::DecoyExposed,
                format!("{} was a decoy", id),
                json!({ "unit": id, "position": position }),
            );
        } else {
            self.record(
                EventType::UnitRevealed,
                format!("{} revealed at {}", id, position),
                json!({ "unit": id, "position": position }),
            );
        }
        self.refresh_visibility();
        Ok(true)
    }

    // === POSITIONS ===

    /// Move a unit and everything it carries to `coord`
    pub fn relocate(&mut self, id: UnitId, coord: HexCoord) -> Result<()> {
        let mut stack = vec![id];
        let mut seen = BTreeSet::new();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            let unit = self.require_unit_mut(next)?;
            unit.position = coord;
            stack.extend(unit.cargo.iter().copied());
        }
        Ok(())
    }

    /// Log a unit's destruction. Everything it carries, at any depth, is
    /// lost with it; returns the ids of the lost passengers.
    pub fn record_destroyed(&mut self, id: UnitId, by: UnitId) -> Result<Vec<UnitId>> {
        let position = self.require_unit(id)?.position;
        self.record(
            EventType::UnitDestroyed,
            format!("{} destroyed at {}", id, position),
            json!({ "unit": id, "by": by, "position": position }),
        );

        let mut lost = Vec::new();
        let mut stack = self.require_unit(id)?.cargo.clone();
        while let Some(next) = stack.pop() {
            let passenger = self.require_unit_mut(next)?;
            if !passenger.is_alive() {
                continue;
            }
            passenger.destroy();
            stack.extend(passenger.cargo.iter().copied());
            lost.push(next);
            self.record(
                EventType::UnitDestroyed,
                format!("{} lost aboard {}", next, id),
                json!({ "unit": next, "by": by, "aboard": id, "position": position }),
            );
        }
        if !lost.is_empty() {
            debug!(transport = %id, lost = lost.len(), "cargo lost with transport");
        }
        Ok(lost)
    }

    /// Keep a mobile base's operations record in step with its HP.
    /// Ends the game at once if the base was destroyed and a victory
    /// condition is met.
    pub fn sync_ship_hull(&mut self, id: UnitId) -> Result<()> {
        let hp = self.require_unit(id)?.hp;
        let owner = self.require_unit(id)?.owner;
        let changed = {
            let player = self.require_player_mut(owner)?;
            match player.ship.as_mut() {
                Some(ops) if ops.ship_id == id => ops.set_hull(hp),
                _ => return Ok(()),
            }
        };

        if let Some(status) = changed {
            self.record(
                EventType::ShipStatusChanged,
                format!(
                    "{} systems now flight {}, well {}, C2 {}",
                    id, status.flight_deck, status.well_deck, status.command_and_control
                ),
                json!({ "unit": id, "hull": hp, "status": status }),
            );
        }

        if hp == 0 && !self.game_over {
            if let Some(outcome) = victory::evaluate(self, false) {
                self.end_game(outcome);
            }
        }
        Ok(())
    }

    pub fn end_game(&mut self, outcome: GameOutcome) {
        self.game_over = true;
        self.outcome = Some(outcome);
        self.record(
            EventType::GameOver,
            format!("{} ({}) wins: {:?}", outcome.winner, outcome.side, outcome.condition),
            json!({ "winner": outcome.winner, "side": outcome.side, "condition": outcome.condition }),
        );
        info!(winner = %outcome.winner, condition = ?outcome.condition, "game over");
    }

    // === PHASES ===

    /// Move to the next phase, running exit and entry hooks
    ///
    /// Leaving End checks victory; a finished game stays on its last turn.
    /// Every transition hands control to the initiative player and
    /// refreshes visibility.
    pub fn advance_phase(&mut self) -> Phase {
        if self.game_over {
            return self.phase;
        }

        if self.phase == Phase::End {
            if let Some(outcome) = victory::evaluate(self, true) {
                self.end_game(outcome);
                self.refresh_visibility();
                return self.phase;
            }
            self.turn += 1;
        }

        let from = self.phase;
        self.phase = from.next();
        self.passed.clear();
        if let Some(initiative) = self.initiative_player() {
            self.active_player = initiative;
        }

        match self.phase {
            Phase::Event => self.begin_turn(),
            Phase::Command => self.generate_command_points(),
            Phase::End => self.end_of_turn_cleanup(),
            _ => {}
        }

        self.refresh_visibility();
        self.record(
            EventType::PhaseChanged,
            format!("Turn {}: {} -> {}", self.turn, from, self.phase),
            json!({ "from": from, "to": self.phase, "turn": self.turn }),
        );
        info!(turn = self.turn, phase = %self.phase, "phase changed");
        self.phase
    }

    fn begin_turn(&mut self) {
        for player in self.players.values_mut() {
            for unit in player.units.values_mut() {
                unit.reset_for_turn();
            }
            if let Some(ops) = player.ship.as_mut() {
                ops.reset_turn();
            }
        }
        self.record(
            EventType::TurnStarted,
            format!("Turn {} begins", self.turn),
            json!({ "turn": self.turn }),
        );
    }

    fn generate_command_points(&mut self) {
        let defender_cp = self.config.defender_command_points;
        let attacker_base = self.config.attacker_base_command_points;
        let mut generated = Vec::new();
        for player in self.players.values_mut() {
            let amount = match player.side {
                Side::Defense => defender_cp,
                Side::Assault => {
                    attacker_base + player.ship.as_ref().map_or(0, |ops| ops.command_points())
                }
            };
            player.command_points = amount;
            generated.push((player.id, amount));
        }
        for (player, amount) in generated {
            self.record(
                EventType::CommandPointsGenerated,
                format!("{} has {} command points", player, amount),
                json!({ "player": player, "amount": amount }),
            );
        }
    }

    fn end_of_turn_cleanup(&mut self) {
        self.map.clear_smoke();
        for player in self.players.values_mut() {
            for unit in player.units.values_mut().filter(|u| u.is_alive()) {
                unit.remove_suppression(SUPPRESSION_RECOVERY_PER_TURN);
            }
        }
    }

    /// Mark `player` as done with the phase. Control passes to the
    /// opponent unless they already passed, in which case the phase
    /// advances.
    pub fn pass_phase(&mut self, player: PlayerId) -> Phase {
        self.passed.insert(player);
        match self.opponent_of(player) {
            Some(opponent) if !self.passed.contains(&opponent) => {
                self.active_player = opponent;
                self.record(
                    EventType::ControlPassed,
                    format!("{} ends {}; {} to act", player, self.phase, opponent),
                    json!({ "from": player, "to": opponent }),
                );
                self.phase
            }
            _ => self.advance_phase(),
        }
    }

    // === PROJECTIONS ===

    pub fn summary(&self) -> GameSummary {
        let players = self
            .players
            .values()
            .map(|p| PlayerSummary {
                id: p.id,
                side: p.side,
                name: p.name.clone(),
                command_points: p.command_points,
                total_units: p.units.len() as u32,
                living_units: p.living_units().count() as u32,
                active_units: p.active_unit_count(),
                objectives_secured: p.objectives_secured(),
                ship: p.ship.as_ref().map(|ops| ShipSummary {
                    hull: ops.hull(),
                    max_hull: ops.max_hull(),
                    ammo: ops.ammo,
                    max_ammo: ops.max_ammo,
                    status: ops.status(),
                }),
            })
            .collect();

        GameSummary {
            game_id: self.id,
            turn: self.turn,
            phase: self.phase,
            active_player: self.active_player,
            game_over: self.game_over,
            outcome: self.outcome,
            players,
            event_count: self.events.len(),
        }
    }
}

/// Check player and unit consistency, keyed by player id
fn validate_players(map: &BattleMap, players: Vec<Player>) -> Result<BTreeMap<PlayerId, Player>> {
    if players.len() != 2 {
        return Err(EngineError::InvalidScenario(format!(
            "expected 2 players, got {}",
            players.len()
        )));
    }

    let mut by_id = BTreeMap::new();
    let mut sides = BTreeSet::new();
    let mut unit_ids = BTreeSet::new();
    for player in players {
        if !sides.insert(player.side) {
            return Err(EngineError::InvalidScenario(format!(
                "two players on the {} side",
                player.side
            )));
        }
        for unit in player.units.values() {
            if !unit_ids.insert(unit.id) {
                return Err(EngineError::InvalidScenario(format!("{} used twice", unit.id)));
            }
            if unit.owner != player.id || unit.side != player.side {
                return Err(EngineError::InvalidScenario(format!(
                    "{} is not registered to {}",
                    unit.id, player.id
                )));
            }
            if !unit.is_embarked() && !map.contains(unit.position) {
                return Err(EngineError::InvalidScenario(format!(
                    "{} deployed off the map at {}",
                    unit.id, unit.position
                )));
            }
        }
        if by_id.insert(player.id, player).is_some() {
            return Err(EngineError::InvalidScenario("duplicate player id".into()));
        }
    }

    for player in by_id.values() {
        for unit in player.units.values() {
            if unit.cargo.len() > unit.cargo_capacity() {
                return Err(EngineError::InvalidScenario(format!(
                    "{} carries {} units, capacity {}",
                    unit.id,
                    unit.cargo.len(),
                    unit.cargo_capacity()
                )));
            }
            for passenger_id in &unit.cargo {
                let passenger = player.unit(*passenger_id).ok_or_else(|| {
                    EngineError::InvalidScenario(format!(
                        "{} carries {}, which {} does not own",
                        unit.id, passenger_id, player.id
                    ))
                })?;
                if passenger.carried_by != Some(unit.id) || !unit.can_carry(passenger) {
                    return Err(EngineError::InvalidScenario(format!(
                        "{} cannot be carried by {}",
                        passenger_id, unit.id
                    )));
                }
            }
            if let Some(transport) = unit.carried_by {
                let listed = player
                    .unit(transport)
                    .is_some_and(|t| t.cargo.contains(&unit.id));
                if !listed {
                    return Err(EngineError::InvalidScenario(format!(
                        "{} is aboard {} but not in its cargo",
                        unit.id, transport
                    )));
                }
            }
        }
    }

    Ok(by_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::unit_type::UnitType;

    fn state() -> GameState {
        let map = BattleMap::new(12, 12);
        let mut attacker = Player::new(PlayerId(1), Side::Assault, "Task Force");
        attacker.add_unit(Unit::new(UnitId(1), UnitType::AssaultShip, PlayerId(1), HexCoord::new(0, 5)));
        attacker.add_unit(Unit::new(UnitId(2), UnitType::MarineSquad, PlayerId(1), HexCoord::new(3, 5)));
        attacker.add_unit(Unit::new(UnitId(3), UnitType::MarineSquad, PlayerId(1), HexCoord::new(3, 6)));
        let mut defender = Player::new(PlayerId(2), Side::Defense, "Garrison");
        defender.add_unit(Unit::new(UnitId(10), UnitType::InfantrySquad, PlayerId(2), HexCoord::new(9, 5)));
        defender.add_unit(Unit::new(UnitId(11), UnitType::DecoyMarker, PlayerId(2), HexCoord::new(9, 7)));
        GameState::new(map, vec![attacker, defender], RulesConfig::default(), Dice::seeded(1)).unwrap()
    }

    #[test]
    fn test_new_state_starts_at_event() {
        let state = state();
        assert_eq!(state.turn, 1);
        assert_eq!(state.phase, Phase::Event);
        assert_eq!(state.active_player, PlayerId(1));
        assert!(state.player(PlayerId(1)).and_then(|p| p.ship.as_ref()).is_some());
        assert_eq!(state.events()[0].event_type, EventType::GameStarted);
    }

    #[test]
    fn test_phase_cycle_wraps_with_turn() {
        let mut state = state();
        let seen: Vec<Phase> = (0..6).map(|_| state.advance_phase()).collect();
        assert_eq!(
            seen,
            vec![
                Phase::Command,
                Phase::Deployment,
                Phase::Movement,
                Phase::Action,
                Phase::End,
                Phase::Event
            ]
        );
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_command_points_generated_on_command() {
        let mut state = state();
        state.advance_phase();
        assert_eq!(state.player(PlayerId(1)).unwrap().command_points, 3);
        assert_eq!(state.player(PlayerId(2)).unwrap().command_points, 2);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut state = state();
        for _ in 0..8 {
            state.advance_phase();
        }
        let stamps: Vec<u64> = state.events().iter().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_pass_phase_hands_control_then_advances() {
        let mut state = state();
        assert_eq!(state.pass_phase(PlayerId(1)), Phase::Event);
        assert_eq!(state.active_player, PlayerId(2));
        assert_eq!(state.pass_phase(PlayerId(2)), Phase::Command);
        assert_eq!(state.active_player, PlayerId(1));
        assert!(state.passed.is_empty());
    }

    #[test]
    fn test_force_reveal_exposes_decoy() {
        let mut state = state();
        assert!(state.force_reveal(UnitId(11)).unwrap());
        let decoy = state.unit(UnitId(11)).unwrap();
        assert!(!decoy.is_alive());
        assert_eq!(state.events().last().map(|e| e.event_type), Some(EventType::DecoyExposed));
        assert!(!state.force_reveal(UnitId(11)).unwrap());
    }

    #[test]
    fn test_force_reveal_missing_unit_is_hard_error() {
        let mut state = state();
        assert!(matches!(
            state.force_reveal(UnitId(999)),
            Err(EngineError::UnitNotFound(_))
        ));
    }

    #[test]
    fn test_end_phase_clears_smoke_and_recovers() {
        let mut state = state();
        state.map.place_smoke(HexCoord::new(5, 5));
        state.unit_mut(UnitId(2)).unwrap().add_suppression(2);
        for _ in 0..5 {
            state.advance_phase();
        }
        assert_eq!(state.phase, Phase::End);
        assert!(!state.map.has_smoke(HexCoord::new(5, 5)));
        assert_eq!(state.unit(UnitId(2)).unwrap().suppression(), 1);
    }

    #[test]
    fn test_new_turn_resets_unit_flags() {
        let mut state = state();
        state.unit_mut(UnitId(2)).unwrap().has_acted = true;
        for _ in 0..6 {
            state.advance_phase();
        }
        assert!(!state.unit(UnitId(2)).unwrap().has_acted);
    }

    #[test]
    fn test_rejects_duplicate_unit_ids() {
        let map = BattleMap::new(4, 4);
        let mut attacker = Player::new(PlayerId(1), Side::Assault, "A");
        attacker.add_unit(Unit::new(UnitId(1), UnitType::MarineSquad, PlayerId(1), HexCoord::new(0, 0)));
        let mut defender = Player::new(PlayerId(2), Side::Defense, "D");
        defender.add_unit(Unit::new(UnitId(1), UnitType::Tank, PlayerId(2), HexCoord::new(3, 3)));
        let result = GameState::new(map, vec![attacker, defender], RulesConfig::default(), Dice::seeded(0));
        assert!(matches!(result, Err(EngineError::InvalidScenario(_))));
    }

    #[test]
    fn test_rejects_off_map_deployment() {
        let map = BattleMap::new(4, 4);
        let mut attacker = Player::new(PlayerId(1), Side::Assault, "A");
        attacker.add_unit(Unit::new(UnitId(1), UnitType::MarineSquad, PlayerId(1), HexCoord::new(9, 9)));
        let defender = Player::new(PlayerId(2), Side::Defense, "D");
        let result = GameState::new(map, vec![attacker, defender], RulesConfig::default(), Dice::seeded(0));
        assert!(matches!(result, Err(EngineError::InvalidScenario(_))));
    }

    #[test]
    fn test_pair_mut_distinct() {
        let mut state = state();
        let (a, b) = state.pair_mut(UnitId(2), UnitId(10)).unwrap();
        a.hp = 1;
        b.hp = 1;
        assert!(state.pair_mut(UnitId(2), UnitId(2)).is_none());
        assert!(state.pair_mut(UnitId(2), UnitId(404)).is_none());
    }

    #[test]
    fn test_summary_reports_ship() {
        let state = state();
        let summary = state.summary();
        let attacker = summary.players.iter().find(|p| p.id == PlayerId(1)).unwrap();
        assert_eq!(attacker.ship.as_ref().map(|s| s.hull), Some(10));
        assert_eq!(attacker.active_units, 3);
    }
}
