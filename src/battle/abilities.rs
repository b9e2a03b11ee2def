//! Special abilities
//!
//! Each ability costs command points, spends the user's action and may
//! have a limited number of uses per game.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::battle::actions::{Action, ActionResult};
use crate::battle::execution::{EventType, GameState};
use crate::battle::hex::HexCoord;
use crate::battle::units::{StatusFlag, Unit};
use crate::battle::visibility::can_detect;
use crate::core::error::{ActionError, RuleViolation};
use crate::core::types::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Remove one suppression token from a friendly unit within 1 hex
    Rally,
    /// Dig in: +1 defense until the unit moves
    Entrench,
    /// Smoke on a hex within 2; blocks sight until the End phase
    SmokeScreen,
    /// Suppress every enemy on a hex and its neighbors
    Barrage,
    /// Go to ground in concealing terrain
    Conceal,
}

impl AbilityKind {
    /// Command point cost
    pub fn cost(&self) -> u32 {
        match self {
            AbilityKind::Barrage => 2,
            _ => 1,
        }
    }

    /// Uses per game; `None` is unlimited
    pub fn max_uses(&self) -> Option<u32> {
        match self {
            AbilityKind::SmokeScreen => Some(2),
            AbilityKind::Barrage => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for AbilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AbilityKind::Rally => "rally",
            AbilityKind::Entrench => "entrench",
            AbilityKind::SmokeScreen => "smoke screen",
            AbilityKind::Barrage => "barrage",
            AbilityKind::Conceal => "conceal",
        };
        f.write_str(name)
    }
}

/// An ability a unit carries, with its remaining uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityState {
    pub kind: AbilityKind,
    pub uses_remaining: Option<u32>,
}

impl AbilityState {
    pub fn new(kind: AbilityKind) -> Self {
        Self {
            kind,
            uses_remaining: kind.max_uses(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.uses_remaining == Some(0)
    }

    fn consume(&mut self) {
        if let Some(uses) = self.uses_remaining.as_mut() {
            *uses = uses.saturating_sub(1);
        }
    }
}

/// What a validated ability will do
enum AbilityEffect {
    Rally { target: UnitId },
    Entrench,
    Smoke { hex: HexCoord },
    Barrage { hex: HexCoord, targets: Vec<UnitId> },
    Conceal,
}

/// Handler for `ActionType::SpecialAbility`
pub(crate) fn use_ability(state: &mut GameState, action: &Action) -> Result<ActionResult, ActionError> {
    let actor_id = action.actor()?;
    let kind = action.data.ability.ok_or(RuleViolation::MissingField("data.ability"))?;
    let effect = validate_ability(state, action, actor_id, kind)?;

    // Validated: commit
    state.require_player_mut(action.player_id)?.command_points -= kind.cost();
    let actor = state.require_unit_mut(actor_id)?;
    if let Some(ability) = actor.ability_mut(kind) {
        ability.consume();
    }
    actor.has_acted = true;
    let origin = actor.position;

    let (message, data) = match effect {
        AbilityEffect::Rally { target } => {
            let unit = state.require_unit_mut(target)?;
            unit.remove_suppression(1);
            (
                format!("{} rallied {}", actor_id, target),
                json!({ "target": target, "suppression": unit.suppression() }),
            )
        }
        AbilityEffect::Entrench => {
            state
                .require_unit_mut(actor_id)?
                .set_flag(StatusFlag::Entrenched, true);
            (format!("{} entrenched at {}", actor_id, origin), json!({}))
        }
        AbilityEffect::Smoke { hex } => {
            state.map.place_smoke(hex);
            (format!("{} laid smoke on {}", actor_id, hex), json!({ "hex": hex }))
        }
        AbilityEffect::Barrage { hex, targets } => {
            // Firing gives the position away; so does being fired on
            state.force_reveal(actor_id)?;
            let mut suppressed = Vec::with_capacity(targets.len());
            for target in &targets {
                state.force_reveal(*target)?;
                let unit = state.require_unit_mut(*target)?;
                if unit.is_alive() {
                    unit.add_suppression(1);
                    suppressed.push(*target);
                }
            }
            (
                format!("{} barraged {} ({} units suppressed)", actor_id, hex, suppressed.len()),
                json!({ "hex": hex, "suppressed": suppressed }),
            )
        }
        AbilityEffect::Conceal => {
            state.require_unit_mut(actor_id)?.hide();
            (format!("{} concealed", actor_id), json!({}))
        }
    };

    let data = json!({
        "unit": actor_id,
        "ability": kind,
        "cost": kind.cost(),
        "effect": data,
    });
    state.record(EventType::AbilityUsed, message.clone(), data.clone());
    state.refresh_visibility();
    debug!(unit = %actor_id, ability = %kind, "ability used");
    Ok(ActionResult::ok(message, data))
}

fn validate_ability(
    state: &GameState,
    action: &Action,
    actor_id: UnitId,
    kind: AbilityKind,
) -> Result<AbilityEffect, RuleViolation> {
    let actor = state.owned_unit(action.player_id, actor_id)?;
    actor.check_ready()?;

    let ability = actor.ability(kind).ok_or(RuleViolation::AbilityUnavailable {
        unit: actor_id,
        ability: kind,
    })?;
    if ability.is_exhausted() {
        return Err(RuleViolation::NoUsesRemaining { ability: kind });
    }

    state
        .player(action.player_id)
        .ok_or(RuleViolation::UnknownPlayer(action.player_id))?
        .check_command_points(kind.cost())?;

    match kind {
        AbilityKind::Rally => {
            let target_id = action.target_id.unwrap_or(actor_id);
            let target = state.owned_unit(action.player_id, target_id)?;
            if !target.is_alive() {
                return Err(RuleViolation::UnitDestroyed(target_id));
            }
            if target.is_embarked() {
                return Err(RuleViolation::UnitEmbarked(target_id));
            }
            if actor.position.distance(&target.position) > 1 {
                return Err(RuleViolation::NotAdjacent);
            }
            if target.suppression() == 0 {
                return Err(RuleViolation::AbilityRequirement("target is not suppressed"));
            }
            Ok(AbilityEffect::Rally { target: target_id })
        }
        AbilityKind::Entrench => {
            if actor.has_moved {
                return Err(RuleViolation::AbilityRequirement("cannot entrench after moving"));
            }
            if actor.is_entrenched() {
                return Err(RuleViolation::AbilityRequirement("unit is already entrenched"));
            }
            Ok(AbilityEffect::Entrench)
        }
        AbilityKind::SmokeScreen => {
            let hex = target_hex(state, action)?;
            let distance = actor.position.distance(&hex);
            if distance > 2 {
                return Err(RuleViolation::OutOfRange { distance });
            }
            Ok(AbilityEffect::Smoke { hex })
        }
        AbilityKind::Barrage => {
            let hex = target_hex(state, action)?;
            let distance = actor.position.distance(&hex);
            if !actor.profile().range.allows(distance) {
                return Err(RuleViolation::OutOfRange { distance });
            }
            Ok(AbilityEffect::Barrage {
                hex,
                targets: barrage_targets(state, actor, hex),
            })
        }
        AbilityKind::Conceal => {
            if actor.is_hidden() {
                return Err(RuleViolation::AbilityRequirement("unit is already hidden"));
            }
            let concealing = state
                .map
                .terrain_at(actor.position)
                .is_some_and(|t| t.provides_concealment());
            if !concealing {
                return Err(RuleViolation::AbilityRequirement("terrain offers no concealment"));
            }
            if state.enemy_combatant_near(actor.side, actor.position, 1) {
                return Err(RuleViolation::AbilityRequirement("enemy units are too close"));
            }
            Ok(AbilityEffect::Conceal)
        }
    }
}

fn target_hex(state: &GameState, action: &Action) -> Result<HexCoord, RuleViolation> {
    let hex = action.position()?;
    if !state.map.contains(hex) {
        return Err(RuleViolation::OffMap(hex));
    }
    Ok(hex)
}

/// Living enemy units on `center` and its six neighbors. Hidden units
/// the firer cannot detect are not hit.
fn barrage_targets(state: &GameState, actor: &Unit, center: HexCoord) -> Vec<UnitId> {
    let mut area = vec![center];
    area.extend(center.neighbors());
    state
        .living_units()
        .filter(|u| u.side != actor.side && !u.is_embarked() && area.contains(&u.position))
        .filter(|u| !u.is_hidden() || can_detect(actor, u))
        .map(|u| u.id)
        .collect()
}
