//! Action handlers for movement, cargo, objectives and the mobile base
//!
//! Every handler follows the same shape: a read-only validation pass that
//! returns a plan (or a `RuleViolation`), then a commit pass that applies
//! the plan and records events. Nothing is mutated before validation has
//! run to completion.

use std::collections::BTreeSet;

use ahash::AHashSet;
use serde_json::json;
use tracing::debug;

use crate::battle::actions::{Action, ActionResult};
use crate::battle::constants::RECOVERY_RANGE;
use crate::battle::execution::{EventType, GameState};
use crate::battle::hex::HexCoord;
use crate::battle::pathfinding::find_path;
use crate::battle::terrain::MovementDomain;
use crate::battle::unit_type::DeckClass;
use crate::battle::units::{StatusFlag, Unit};
use crate::core::error::{ActionError, RuleViolation};
use crate::core::types::UnitId;

type Handled = Result<ActionResult, ActionError>;

// === MOVEMENT ===

pub(crate) fn move_unit(state: &mut GameState, action: &Action) -> Handled {
    let unit_id = action.actor()?;
    let destination = action.position()?;
    let path = plan_move(state, action, unit_id, destination)?;

    let unit = state.require_unit_mut(unit_id)?;
    let from = unit.position;
    let was_hidden = unit.is_hidden();
    unit.has_moved = true;
    unit.set_flag(StatusFlag::Entrenched, false);
    state.relocate(unit_id, destination)?;

    let steps = path.len().saturating_sub(1);
    let message = format!("{} moved {} -> {} ({} hexes)", unit_id, from, destination, steps);
    let data = json!({ "unit": unit_id, "from": from, "to": destination, "path": path });
    state.record(EventType::UnitMoved, message.clone(), data.clone());

    if was_hidden {
        state.force_reveal(unit_id)?;
    } else {
        state.refresh_visibility();
    }
    debug!(unit = %unit_id, to = %destination, "moved");
    Ok(ActionResult::ok(message, data))
}

fn plan_move(
    state: &GameState,
    action: &Action,
    unit_id: UnitId,
    destination: HexCoord,
) -> Result<Vec<HexCoord>, RuleViolation> {
    let unit = state.owned_unit(action.player_id, unit_id)?;
    unit.check_ready()?;
    if unit.has_moved {
        return Err(RuleViolation::AlreadyMoved(unit_id));
    }
    let profile = unit.profile();
    if !unit.can_move() {
        return Err(RuleViolation::CannotMove(unit_id));
    }

    let terrain = state
        .map
        .terrain_at(destination)
        .ok_or(RuleViolation::OffMap(destination))?;
    if state.map.movement_cost(destination, profile.domain).is_none() {
        return Err(RuleViolation::TerrainRestricted { terrain });
    }
    if destination == unit.position {
        return Err(RuleViolation::NoPath(destination));
    }
    if state.is_occupied(destination) {
        return Err(RuleViolation::HexOccupied(destination));
    }

    let enemies: AHashSet<HexCoord> = state
        .living_units()
        .filter(|u| u.side != unit.side && !u.is_embarked())
        .map(|u| u.position)
        .collect();
    let domain = profile.domain;
    let path = find_path(
        unit.position,
        destination,
        |hex| {
            if enemies.contains(&hex) {
                return None;
            }
            state.map.movement_cost(hex, domain)
        },
        unit.stats.movement,
    );
    if path.is_empty() {
        return Err(RuleViolation::NoPath(destination));
    }
    Ok(path)
}

/// Hex can take a unit of `domain` and nobody but `ignore` stands there
fn landing_zone(
    state: &GameState,
    hex: HexCoord,
    domain: MovementDomain,
    ignore: UnitId,
) -> Result<(), RuleViolation> {
    let terrain = state.map.terrain_at(hex).ok_or(RuleViolation::OffMap(hex))?;
    if state.map.movement_cost(hex, domain).is_none() {
        return Err(RuleViolation::TerrainRestricted { terrain });
    }
    if state.units_at(hex).any(|u| u.id != ignore) {
        return Err(RuleViolation::HexOccupied(hex));
    }
    Ok(())
}

// === CARGO ===

fn is_mobile_base(state: &GameState, unit: &Unit) -> bool {
    state
        .player(unit.owner)
        .and_then(|p| p.ship.as_ref())
        .is_some_and(|ops| ops.ship_id == unit.id)
}

pub(crate) fn load(state: &mut GameState, action: &Action) -> Handled {
    let passenger_id = action.actor()?;
    let transport_id = action.target()?;
    validate_load(state, action, passenger_id, transport_id)?;

    let transport_position = state.require_unit(transport_id)?.position;
    let passenger = state.require_unit_mut(passenger_id)?;
    passenger.embark(transport_id, transport_position);
    passenger.has_moved = true;
    state.relocate(passenger_id, transport_position)?;
    state.require_unit_mut(transport_id)?.cargo.push(passenger_id);

    let message = format!("{} boarded {}", passenger_id, transport_id);
    let data = json!({ "unit": passenger_id, "transport": transport_id, "position": transport_position });
    state.record(EventType::UnitLoaded, message.clone(), data.clone());
    state.refresh_visibility();
    Ok(ActionResult::ok(message, data))
}

fn validate_load(
    state: &GameState,
    action: &Action,
    passenger_id: UnitId,
    transport_id: UnitId,
) -> Result<(), RuleViolation> {
    let passenger = state.owned_unit(action.player_id, passenger_id)?;
    passenger.check_ready()?;
    let transport = state.owned_unit(action.player_id, transport_id)?;

    if !transport.is_alive() {
        return Err(RuleViolation::UnitDestroyed(transport_id));
    }
    if transport.is_embarked() {
        return Err(RuleViolation::UnitEmbarked(transport_id));
    }
    if is_mobile_base(state, transport) {
        return Err(RuleViolation::UseMobileBase);
    }
    if transport.cargo_capacity() == 0 {
        return Err(RuleViolation::NotATransport(transport_id));
    }
    if !transport.can_carry(passenger) {
        return Err(RuleViolation::CargoIncompatible {
            transport: transport_id,
            passenger: passenger_id,
        });
    }
    if transport.cargo_space() == 0 {
        return Err(RuleViolation::CargoFull {
            capacity: transport.cargo_capacity(),
        });
    }
    if passenger.position.distance(&transport.position) > 1 {
        return Err(RuleViolation::NotAdjacent);
    }
    Ok(())
}

pub(crate) fn unload(state: &mut GameState, action: &Action) -> Handled {
    let transport_id = action.actor()?;
    let passenger_id = action.target()?;
    let destination = action.position()?;
    validate_unload(state, action, transport_id, passenger_id, destination)?;

    state
        .require_unit_mut(transport_id)?
        .cargo
        .retain(|id| *id != passenger_id);
    let passenger = state.require_unit_mut(passenger_id)?;
    passenger.disembark(destination);
    passenger.has_moved = true;
    state.relocate(passenger_id, destination)?;

    let message = format!("{} unloaded {} at {}", transport_id, passenger_id, destination);
    let data = json!({ "unit": passenger_id, "transport": transport_id, "position": destination });
    state.record(EventType::UnitUnloaded, message.clone(), data.clone());
    state.refresh_visibility();
    Ok(ActionResult::ok(message, data))
}

fn validate_unload(
    state: &GameState,
    action: &Action,
    transport_id: UnitId,
    passenger_id: UnitId,
    destination: HexCoord,
) -> Result<(), RuleViolation> {
    let transport = state.owned_unit(action.player_id, transport_id)?;
    if !transport.is_alive() {
        return Err(RuleViolation::UnitDestroyed(transport_id));
    }
    if transport.is_embarked() {
        return Err(RuleViolation::UnitEmbarked(transport_id));
    }
    if is_mobile_base(state, transport) {
        return Err(RuleViolation::UseMobileBase);
    }
    if transport.cargo_capacity() == 0 {
        return Err(RuleViolation::NotATransport(transport_id));
    }

    let passenger = state.owned_unit(action.player_id, passenger_id)?;
    if passenger.carried_by != Some(transport_id) {
        return Err(RuleViolation::NotInCargo {
            unit: passenger_id,
            transport: transport_id,
        });
    }
    if transport.position.distance(&destination) > 1 {
        return Err(RuleViolation::NotAdjacent);
    }
    landing_zone(state, destination, passenger.profile().domain, transport_id)
}

// === REVEAL & OBJECTIVES ===

pub(crate) fn reveal(state: &mut GameState, action: &Action) -> Handled {
    let unit_id = action.actor()?;
    let unit = state.owned_unit(action.player_id, unit_id)?;
    if !unit.is_alive() {
        return Err(RuleViolation::UnitDestroyed(unit_id).into());
    }
    if unit.is_embarked() {
        return Err(RuleViolation::UnitEmbarked(unit_id).into());
    }
    if !unit.is_hidden() {
        return Err(RuleViolation::NotHidden(unit_id).into());
    }
    let position = unit.position;

    state.force_reveal(unit_id)?;
    let alive = state.require_unit(unit_id)?.is_alive();
    let message = if alive {
        format!("{} revealed itself at {}", unit_id, position)
    } else {
        format!("{} was a decoy and has been removed", unit_id)
    };
    Ok(ActionResult::ok(
        message,
        json!({ "unit": unit_id, "position": position, "decoy": !alive }),
    ))
}

pub(crate) fn secure_objective(state: &mut GameState, action: &Action) -> Handled {
    let unit_id = action.actor()?;
    let unit = state.owned_unit(action.player_id, unit_id)?;
    unit.check_ready()?;
    if !unit.profile().can_secure() {
        return Err(RuleViolation::CannotSecure(unit_id).into());
    }
    let marker = state
        .map
        .objective_at(unit.position)
        .ok_or(RuleViolation::NotOnObjective)?;
    if marker.controller == Some(action.player_id) {
        return Err(RuleViolation::ObjectiveAlreadyHeld(marker.id).into());
    }
    if state.enemy_combatant_near(unit.side, unit.position, 1) {
        return Err(RuleViolation::ObjectiveContested(marker.id).into());
    }
    let objective = marker.id;
    let name = marker.name.clone();
    let position = unit.position;
    let previous = marker.controller;

    state.map.set_objective_controller(objective, Some(action.player_id))?;
    let turn = state.turn;
    for player in state.players.values_mut() {
        player.record_objective(objective, player.id == action.player_id, turn);
    }
    state.require_unit_mut(unit_id)?.has_acted = true;

    let message = format!("{} secured {} ({})", unit_id, name, objective);
    let data = json!({
        "unit": unit_id,
        "objective": objective,
        "position": position,
        "previous_controller": previous,
    });
    state.record(EventType::ObjectiveSecured, message.clone(), data.clone());
    Ok(ActionResult::ok(message, data))
}

// === MOBILE BASE ===

/// The acting unit must be the submitting player's living mobile base
pub(crate) fn validate_mobile_base(state: &GameState, action: &Action) -> Result<UnitId, RuleViolation> {
    let ship_id = action.actor()?;
    let ship = state.owned_unit(action.player_id, ship_id)?;
    let ops = state
        .player(action.player_id)
        .and_then(|p| p.ship.as_ref())
        .ok_or(RuleViolation::NoMobileBase)?;
    if ops.ship_id != ship_id {
        return Err(RuleViolation::NotMobileBase(ship_id));
    }
    if !ship.is_alive() {
        return Err(RuleViolation::UnitDestroyed(ship_id));
    }
    Ok(ship_id)
}

fn validate_batch(action: &Action) -> Result<&[UnitId], RuleViolation> {
    let batch = action.data.unit_ids.as_slice();
    if batch.is_empty() {
        return Err(RuleViolation::EmptyBatch);
    }
    let mut seen = BTreeSet::new();
    for id in batch {
        if !seen.insert(*id) {
            return Err(RuleViolation::DuplicateUnit(*id));
        }
    }
    Ok(batch)
}

pub(crate) fn launch(state: &mut GameState, action: &Action) -> Handled {
    let ship_id = validate_mobile_base(state, action)?;
    let batch = validate_batch(action)?;

    let mut decks: Vec<DeckClass> = Vec::with_capacity(batch.len());
    for id in batch {
        let unit = state.owned_unit(action.player_id, *id)?;
        if unit.carried_by != Some(ship_id) {
            return Err(RuleViolation::NotInCargo {
                unit: *id,
                transport: ship_id,
            }
            .into());
        }
        if !unit.is_alive() {
            return Err(RuleViolation::UnitDestroyed(*id).into());
        }
        let deck = unit.profile().deck.ok_or(RuleViolation::NotLaunchable(*id))?;
        decks.push(deck);
    }

    let ops = state
        .player(action.player_id)
        .and_then(|p| p.ship.as_ref())
        .ok_or(RuleViolation::NoMobileBase)?;
    let plan = ops.check_launch(&decks)?;
    let ship_position = state.require_unit(ship_id)?.position;
    let placements = launch_positions(state, ship_position, batch.len());

    // Validated: commit
    if let Some(ops) = state.require_player_mut(action.player_id)?.ship.as_mut() {
        ops.commit_launch(&plan);
    }
    let mut launched = Vec::with_capacity(batch.len());
    for (id, hex) in batch.iter().zip(placements) {
        state.require_unit_mut(ship_id)?.cargo.retain(|c| c != id);
        state.require_unit_mut(*id)?.disembark(hex);
        state.relocate(*id, hex)?;
        state.record(
            EventType::UnitLaunched,
            format!("{} launched from {} to {}", id, ship_id, hex),
            json!({ "unit": id, "ship": ship_id, "position": hex }),
        );
        launched.push(json!({ "unit": id, "position": hex }));
    }
    state.refresh_visibility();

    let message = format!("{} units launched from {}", launched.len(), ship_id);
    debug!(ship = %ship_id, count = launched.len(), "launch committed");
    Ok(ActionResult::ok(
        message,
        json!({
            "ship": ship_id,
            "launched": launched,
            "flight": plan.flight,
            "well_heavy": plan.well_heavy,
            "well_light": plan.well_light,
        }),
    ))
}

/// First unoccupied adjacent water hex for each launched unit, else the
/// ship's own hex
fn launch_positions(state: &GameState, ship_position: HexCoord, count: usize) -> Vec<HexCoord> {
    let mut taken: Vec<HexCoord> = Vec::with_capacity(count);
    let mut placements = Vec::with_capacity(count);
    for _ in 0..count {
        let spot = ship_position.neighbors().into_iter().find(|hex| {
            state.map.is_water(*hex) && !state.is_occupied(*hex) && !taken.contains(hex)
        });
        match spot {
            Some(hex) => {
                taken.push(hex);
                placements.push(hex);
            }
            None => placements.push(ship_position),
        }
    }
    placements
}

pub(crate) fn recover(state: &mut GameState, action: &Action) -> Handled {
    let ship_id = validate_mobile_base(state, action)?;
    let batch = validate_batch(action)?;
    let ship = state.require_unit(ship_id)?;
    let ship_position = ship.position;

    let mut space = ship.cargo_space();
    let mut accepted = Vec::new();
    let mut refused = Vec::new();
    for id in batch {
        match check_recovery(state, action, ship, *id, space) {
            Ok(()) => {
                space -= 1;
                accepted.push(*id);
            }
            Err(reason) => refused.push(json!({ "unit": id, "reason": reason.to_string() })),
        }
    }
    if accepted.is_empty() {
        return Err(RuleViolation::NothingRecovered.into());
    }

    for id in &accepted {
        let unit = state.require_unit_mut(*id)?;
        unit.embark(ship_id, ship_position);
        unit.has_moved = true;
        state.relocate(*id, ship_position)?;
        state.require_unit_mut(ship_id)?.cargo.push(*id);
        state.record(
            EventType::UnitRecovered,
            format!("{} recovered aboard {}", id, ship_id),
            json!({ "unit": id, "ship": ship_id }),
        );
    }
    state.refresh_visibility();

    let message = format!(
        "{} of {} units recovered aboard {}",
        accepted.len(),
        batch.len(),
        ship_id
    );
    Ok(ActionResult::ok(
        message,
        json!({ "ship": ship_id, "recovered": accepted, "refused": refused }),
    ))
}

fn check_recovery(
    state: &GameState,
    action: &Action,
    ship: &Unit,
    id: UnitId,
    space: usize,
) -> Result<(), RuleViolation> {
    let unit = state.owned_unit(action.player_id, id)?;
    if !unit.is_alive() {
        return Err(RuleViolation::UnitDestroyed(id));
    }
    if unit.is_embarked() {
        return Err(RuleViolation::UnitEmbarked(id));
    }
    if !ship.can_carry(unit) {
        return Err(RuleViolation::CargoIncompatible {
            transport: ship.id,
            passenger: id,
        });
    }
    if unit.position.distance(&ship.position) > RECOVERY_RANGE {
        return Err(RuleViolation::NotAdjacent);
    }
    if space == 0 {
        return Err(RuleViolation::CargoFull {
            capacity: ship.cargo_capacity(),
        });
    }
    Ok(())
}

pub(crate) fn resupply(state: &mut GameState, action: &Action) -> Handled {
    let player = state
        .player(action.player_id)
        .ok_or(RuleViolation::UnknownPlayer(action.player_id))?;
    let ops = player.ship.as_ref().ok_or(RuleViolation::NoMobileBase)?;
    if ops.is_destroyed() {
        return Err(RuleViolation::UnitDestroyed(ops.ship_id).into());
    }
    if ops.ammo >= ops.max_ammo {
        return Err(RuleViolation::MagazineFull.into());
    }
    let cost = state.config.resupply_cost;
    player.check_command_points(cost)?;

    let amount = state.config.resupply_amount;
    let player = state.require_player_mut(action.player_id)?;
    let Some(ops) = player.ship.as_mut() else {
        return Err(RuleViolation::NoMobileBase.into());
    };
    let added = ops.resupply(amount);
    let (ship_id, ammo) = (ops.ship_id, ops.ammo);
    player.command_points -= cost;

    let message = format!("{} resupplied: +{} rounds ({} aboard)", ship_id, added, ammo);
    let data = json!({ "ship": ship_id, "added": added, "ammo": ammo, "cost": cost });
    state.record(EventType::Resupplied, message.clone(), data.clone());
    Ok(ActionResult::ok(message, data))
}

// === TURN CONTROL ===

pub(crate) fn end_phase(state: &mut GameState, action: &Action) -> Handled {
    let turn = state.turn;
    let phase = state.phase;
    let now = state.pass_phase(action.player_id);
    let message = if state.game_over {
        "game over".to_string()
    } else if now != phase || state.turn != turn {
        format!("turn {} {}", state.turn, now)
    } else {
        format!("{} to act in {}", state.active_player, now)
    };
    Ok(ActionResult::ok(
        message,
        json!({ "turn": state.turn, "phase": now, "active_player": state.active_player }),
    ))
}
