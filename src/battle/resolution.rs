//! Combat resolution between two units
//!
//! Dice pools and thresholds are ADDITIVE. Resolution is split into
//! profile, roll, damage and post-effect steps so callers (point defense)
//! can interpose between the roll and the damage.

use ahash::AHashSet;
use serde::Serialize;

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::{
    AMBUSH_BONUS_DICE, ENTRENCHED_DEFENSE_BONUS, FLANK_BONUS_DICE, MIN_HIT_THRESHOLD,
};
use crate::battle::dice::DiceRoller;
use crate::battle::hex::HexCoord;
use crate::battle::unit_type::PostEffect;
use crate::battle::units::{StatusFlag, Unit};
use crate::battle::visibility::{can_detect, clear_line};
use crate::core::error::RuleViolation;

/// Situational modifiers supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttackModifiers {
    pub ambush: bool,
    pub terrain_cover: u32,
    pub fortification_bonus: u32,
}

impl AttackModifiers {
    /// Cover and fortification at the defender's hex
    pub fn at(map: &BattleMap, defender_position: HexCoord, ambush: bool) -> Self {
        Self {
            ambush,
            terrain_cover: map.terrain_cover(defender_position),
            fortification_bonus: map.fortification_bonus(defender_position),
        }
    }
}

/// Dice pool and hit threshold for one attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackProfile {
    pub dice: u32,
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceOutcome {
    pub rolls: Vec<u8>,
    pub hits: u32,
}

/// What `apply_hits` did to the defender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DamageReport {
    pub damage: u32,
    pub hp_lost: u32,
    pub defender_hp: u32,
    pub defender_destroyed: bool,
    /// Defender's suppression before this attack
    pub suppression_before: u8,
    pub supply_consumed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombatResult {
    pub profile: AttackProfile,
    pub outcome: DiceOutcome,
    pub damage: DamageReport,
    pub post_effect_applied: bool,
}

/// Compute dice and threshold
///
/// dice = attack + flank (adjacent) + ambush + profile bonuses.
/// threshold = defense + cover + fortification (+1 entrenched), at least 1.
pub fn attack_profile(attacker: &Unit, defender: &Unit, modifiers: &AttackModifiers) -> AttackProfile {
    let attacker_profile = attacker.profile();
    let defender_profile = defender.profile();

    let mut dice = attacker.stats.attack;
    if attacker.position.distance(&defender.position) == 1 {
        dice += FLANK_BONUS_DICE;
    }
    if modifiers.ambush {
        dice += AMBUSH_BONUS_DICE;
    }
    dice += attacker_profile.bonus_dice(
        &defender_profile,
        attacker.has_moved,
        defender.has_status(StatusFlag::FreshlyRevealed),
    );

    let mut threshold =
        defender.stats.defense + modifiers.terrain_cover + modifiers.fortification_bonus;
    if defender.is_entrenched() {
        threshold += ENTRENCHED_DEFENSE_BONUS;
    }

    AttackProfile {
        dice,
        threshold: threshold.max(MIN_HIT_THRESHOLD),
    }
}

/// Roll `dice` d6; each die at or above `threshold` is a hit
pub fn roll_hits(dice: u32, threshold: u32, roller: &mut impl DiceRoller) -> DiceOutcome {
    let rolls = roller.roll_many(dice);
    let hits = rolls.iter().filter(|&&r| r as u32 >= threshold).count() as u32;
    DiceOutcome { rolls, hits }
}

/// Apply `hits` as damage and spend the attacker's action and supply
pub fn apply_hits(attacker: &mut Unit, defender: &mut Unit, hits: u32) -> DamageReport {
    let suppression_before = defender.suppression();
    let hp_lost = defender.apply_damage(hits);

    attacker.has_acted = true;
    let supply_consumed = attacker.consume_supply();

    DamageReport {
        damage: hits,
        hp_lost,
        defender_hp: defender.hp,
        defender_destroyed: !defender.is_alive(),
        suppression_before,
        supply_consumed,
    }
}

/// Attacker-specific effects after damage. Safe to call more than once
/// for the same attack: returns true only when it changed something.
pub fn apply_post_effects(attacker: &Unit, defender: &mut Unit, report: &DamageReport) -> bool {
    match attacker.profile().post_effect {
        PostEffect::None => false,
        PostEffect::AlwaysSuppress => {
            if !defender.is_alive() || defender.suppression() > report.suppression_before {
                return false;
            }
            let before = defender.suppression();
            defender.add_suppression(1);
            defender.suppression() != before
        }
    }
}

/// Full resolution: profile, roll, damage, post effects
pub fn resolve(
    attacker: &mut Unit,
    defender: &mut Unit,
    modifiers: &AttackModifiers,
    roller: &mut impl DiceRoller,
) -> CombatResult {
    let profile = attack_profile(attacker, defender, modifiers);
    let outcome = roll_hits(profile.dice, profile.threshold, roller);
    let damage = apply_hits(attacker, defender, outcome.hits);
    let post_effect_applied = apply_post_effects(attacker, defender, &damage);

    CombatResult {
        profile,
        outcome,
        damage,
        post_effect_applied,
    }
}

/// Whether `attacker` may legally attack `defender` right now
pub fn can_attack(
    attacker: &Unit,
    defender: &Unit,
    map: &BattleMap,
    blockers: &AHashSet<HexCoord>,
) -> Result<(), RuleViolation> {
    attacker.check_ready()?;
    if attacker.stats.attack == 0 {
        return Err(RuleViolation::NoAttack(attacker.id));
    }
    if attacker.side == defender.side {
        return Err(RuleViolation::FriendlyTarget);
    }
    if !defender.is_alive() {
        return Err(RuleViolation::TargetDestroyed(defender.id));
    }
    if defender.is_embarked() || !map.contains(defender.position) {
        return Err(RuleViolation::OffMap(defender.position));
    }
    if defender.is_hidden() && !can_detect(attacker, defender) {
        return Err(RuleViolation::HiddenTarget);
    }

    let profile = attacker.profile();
    let distance = attacker.position.distance(&defender.position);
    if !profile.range.allows(distance) {
        return Err(RuleViolation::OutOfRange { distance });
    }
    if !profile.may_target(&defender.profile()) {
        return Err(RuleViolation::InvalidTargetCategory);
    }
    if !clear_line(map, blockers, attacker.position, defender.position) {
        return Err(RuleViolation::NoLineOfSight);
    }
    Ok(())
}
