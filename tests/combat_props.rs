//! Property tests for dice resolution and damage

use littoral_assault::battle::resolution::{apply_hits, roll_hits};
use littoral_assault::battle::*;
use littoral_assault::core::types::{PlayerId, UnitId};
use proptest::prelude::*;

fn pair() -> (Unit, Unit) {
    let attacker = Unit::new(UnitId(1), UnitType::MarineSquad, PlayerId(1), HexCoord::new(0, 0));
    let defender = Unit::new(UnitId(2), UnitType::InfantrySquad, PlayerId(2), HexCoord::new(1, 0));
    (attacker, defender)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_hits_count_rolls_at_threshold(
        seed in any::<u64>(),
        dice in 0u32..12,
        threshold in 1u32..8,
    ) {
        let mut roller = Dice::seeded(seed);
        let outcome = roll_hits(dice, threshold, &mut roller);
        prop_assert_eq!(outcome.rolls.len() as u32, dice);
        prop_assert!(outcome.rolls.iter().all(|r| (1..=6).contains(r)));
        let expected = outcome.rolls.iter().filter(|r| **r as u32 >= threshold).count() as u32;
        prop_assert_eq!(outcome.hits, expected);
        prop_assert!(outcome.hits <= dice);
    }

    #[test]
    fn prop_scripted_dice_are_replayed(faces in proptest::collection::vec(1u8..=6, 1..10)) {
        let mut roller = Dice::scripted(faces.clone());
        let outcome = roll_hits(faces.len() as u32, 4, &mut roller);
        prop_assert_eq!(outcome.rolls, faces);
    }

    #[test]
    fn prop_damage_bounded_by_dice(seed in any::<u64>(), attack in 0u32..8) {
        let (mut attacker, mut defender) = pair();
        attacker.stats.attack = attack;
        let mut roller = Dice::seeded(seed);
        let result = resolve(&mut attacker, &mut defender, &AttackModifiers::default(), &mut roller);
        prop_assert!(result.damage.damage <= result.profile.dice);
        prop_assert_eq!(result.damage.damage, result.outcome.hits);
        prop_assert!(result.profile.threshold >= 1);
        prop_assert!(attacker.has_acted);
    }

    #[test]
    fn prop_survivable_damage_suppresses(hits in 1u32..3, tokens in 0u8..=2) {
        let (mut attacker, mut defender) = pair();
        defender.set_suppression(tokens);
        let hp = defender.hp;
        let report = apply_hits(&mut attacker, &mut defender, hits);
        prop_assert!(hits < hp);
        prop_assert_eq!(defender.hp, hp - hits);
        prop_assert_eq!(report.hp_lost, hits);
        prop_assert_eq!(defender.suppression(), (tokens + 1).min(2));
        prop_assert!(defender.is_alive());
    }

    #[test]
    fn prop_lethal_damage_destroys(hits in 3u32..10) {
        let (mut attacker, mut defender) = pair();
        let report = apply_hits(&mut attacker, &mut defender, hits);
        prop_assert_eq!(defender.hp, 0);
        prop_assert!(report.defender_destroyed);
        prop_assert_eq!(report.hp_lost, 3);
        prop_assert_eq!(report.defender_hp, 0);
    }

    #[test]
    fn prop_supply_drains_once_per_attack(attacks in 1usize..8) {
        let (mut attacker, mut defender) = pair();
        for _ in 0..attacks {
            attacker.has_acted = false;
            apply_hits(&mut attacker, &mut defender, 0);
        }
        prop_assert_eq!(attacker.supply, Some(4u32.saturating_sub(attacks as u32)));
    }
}
