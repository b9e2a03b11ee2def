//! Engagements: direct attacks and guided intercepts
//!
//! An attack reveals both parties before dice are rolled. A hidden target
//! that turns out to be a decoy absorbs the attack and is removed.

use serde_json::json;
use tracing::debug;

use crate::battle::actions::{Action, ActionResult};
use crate::battle::execution::{EventType, GameState};
use crate::battle::handlers::validate_mobile_base;
use crate::battle::resolution::{
    apply_hits, apply_post_effects, attack_profile, can_attack, roll_hits, AttackModifiers,
};
use crate::battle::ship_ops::DefenseRoll;
use crate::battle::visibility::can_detect;
use crate::core::error::{ActionError, EngineError, RuleViolation};
use crate::core::types::UnitId;

type Handled = Result<ActionResult, ActionError>;

pub(crate) fn attack(state: &mut GameState, action: &Action) -> Handled {
    let attacker_id = action.actor()?;
    let defender_id = action.target()?;
    let ambush = action.data.ambush;
    validate_attack(state, action, attacker_id, defender_id)?;

    // Both sides come out of hiding before the dice are thrown
    state.force_reveal(attacker_id)?;
    state.force_reveal(defender_id)?;

    if !state.require_unit(defender_id)?.is_alive() {
        let attacker = state.require_unit_mut(attacker_id)?;
        attacker.has_acted = true;
        let message = format!("{} fired on a decoy ({})", attacker_id, defender_id);
        let data = json!({ "attacker": attacker_id, "defender": defender_id, "decoy": true });
        state.record(EventType::UnitAttacked, message.clone(), data.clone());
        return Ok(ActionResult::ok(message, data));
    }

    let attacker = state.require_unit(attacker_id)?;
    let defender = state.require_unit(defender_id)?;
    let modifiers = AttackModifiers::at(&state.map, defender.position, ambush);
    let profile = attack_profile(attacker, defender, &modifiers);
    let defender_owner = defender.owner;
    let outcome = roll_hits(profile.dice, profile.threshold, &mut state.dice);

    let mut hits = outcome.hits;
    let mut point_defense: Option<DefenseRoll> = None;
    if hits > 0 && state.config.auto_point_defense {
        let (pd_dice, pd_threshold) = (state.config.point_defense_dice, state.config.point_defense_threshold);
        let dice = &mut state.dice;
        let ops = state
            .players
            .get_mut(&defender_owner)
            .and_then(|p| p.ship.as_mut())
            .filter(|ops| ops.ship_id == defender_id && ops.ammo > 0);
        if let Some(Ok(salvo)) = ops.map(|ops| ops.point_defense(hits, pd_dice, pd_threshold, dice)) {
            hits -= salvo.successes;
            point_defense = Some(salvo);
        }
    }
    if let Some(salvo) = &point_defense {
        state.record(
            EventType::PointDefenseFired,
            format!("{} point defense negated {} hits", defender_id, salvo.successes),
            json!({ "ship": defender_id, "rolls": salvo.rolls, "negated": salvo.successes }),
        );
    }

    let (attacker, defender) = state
        .pair_mut(attacker_id, defender_id)
        .ok_or(EngineError::UnitNotFound(defender_id))?;
    let report = apply_hits(attacker, defender, hits);
    let post_effect_applied = apply_post_effects(attacker, defender, &report);

    let message = format!(
        "{} attacked {}: {} dice at {}+, {} hits, {} damage",
        attacker_id, defender_id, profile.dice, profile.threshold, outcome.hits, report.damage
    );
    let data = json!({
        "attacker": attacker_id,
        "defender": defender_id,
        "dice": profile.dice,
        "threshold": profile.threshold,
        "rolls": outcome.rolls,
        "hits": outcome.hits,
        "damage": report.damage,
        "defender_hp": report.defender_hp,
        "destroyed": report.defender_destroyed,
        "post_effect": post_effect_applied,
        "ambush": ambush,
        "point_defense": point_defense,
    });
    state.record(EventType::UnitAttacked, message.clone(), data.clone());
    if report.defender_destroyed {
        state.record_destroyed(defender_id, attacker_id)?;
    }

    state.sync_ship_hull(defender_id)?;
    state.refresh_visibility();
    debug!(attacker = %attacker_id, defender = %defender_id, damage = report.damage, "attack resolved");
    Ok(ActionResult::ok(message, data))
}

fn validate_attack(
    state: &GameState,
    action: &Action,
    attacker_id: UnitId,
    defender_id: UnitId,
) -> Result<(), RuleViolation> {
    let attacker = state.owned_unit(action.player_id, attacker_id)?;
    let defender = state
        .unit(defender_id)
        .ok_or(RuleViolation::UnknownUnit(defender_id))?;
    if action.data.ambush && !attacker.is_hidden() {
        return Err(RuleViolation::AmbushNotConcealed);
    }
    can_attack(attacker, defender, &state.map, &state.unit_blockers())
}

pub(crate) fn intercept(state: &mut GameState, action: &Action) -> Handled {
    let ship_id = validate_mobile_base(state, action)?;
    let target_id = action.target()?;
    validate_intercept(state, action, ship_id, target_id)?;
    state.force_reveal(target_id)?;

    let (dice_count, threshold) = (state.config.intercept_dice, state.config.intercept_threshold);
    let dice = &mut state.dice;
    let ops = state
        .players
        .get_mut(&action.player_id)
        .and_then(|p| p.ship.as_mut())
        .ok_or(RuleViolation::NoMobileBase)?;
    let salvo = ops.intercept(dice_count, threshold, dice)?;
    let ammo_left = ops.ammo;

    let target = state.require_unit_mut(target_id)?;
    let hp_lost = target.apply_damage(salvo.successes);
    let destroyed = !target.is_alive();

    let message = format!(
        "{} intercepted {}: {} hits, {} damage",
        ship_id, target_id, salvo.successes, hp_lost
    );
    let data = json!({
        "ship": ship_id,
        "target": target_id,
        "rolls": salvo.rolls,
        "hits": salvo.successes,
        "damage": hp_lost,
        "destroyed": destroyed,
        "ammo": ammo_left,
    });
    state.record(EventType::InterceptFired, message.clone(), data.clone());
    if destroyed {
        state.record_destroyed(target_id, ship_id)?;
    }
    state.refresh_visibility();
    Ok(ActionResult::ok(message, data))
}

fn validate_intercept(
    state: &GameState,
    action: &Action,
    ship_id: UnitId,
    target_id: UnitId,
) -> Result<(), RuleViolation> {
    let ship = state.owned_unit(action.player_id, ship_id)?;
    let target = state
        .unit(target_id)
        .ok_or(RuleViolation::UnknownUnit(target_id))?;
    if target.side == ship.side {
        return Err(RuleViolation::FriendlyTarget);
    }
    if !target.is_alive() {
        return Err(RuleViolation::TargetDestroyed(target_id));
    }
    if target.is_embarked() {
        return Err(RuleViolation::OffMap(target.position));
    }
    if !target.profile().is_airborne() {
        return Err(RuleViolation::InvalidTargetCategory);
    }
    if target.is_hidden() && !can_detect(ship, target) {
        return Err(RuleViolation::HiddenTarget);
    }
    let distance = ship.position.distance(&target.position);
    if distance > state.config.intercept_range {
        return Err(RuleViolation::OutOfRange { distance });
    }
    state
        .player(action.player_id)
        .and_then(|p| p.ship.as_ref())
        .ok_or(RuleViolation::NoMobileBase)?
        .check_ammo()
}
