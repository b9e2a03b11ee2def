//! Unit types and their capability table
//!
//! Everything that differs between unit types lives in `UnitType::profile`.
//! Range, cargo, sight and bonus rules read the profile instead of matching
//! on the type.

use serde::{Deserialize, Serialize};

use crate::battle::abilities::AbilityKind;
use crate::battle::constants::{
    AIR_SIGHT_RANGE, BASE_DETECTION_RANGE, BASE_SIGHT_RANGE, RECON_DETECTION_RANGE,
    SHIP_SIGHT_RANGE,
};
use crate::battle::player::Side;
use crate::battle::terrain::MovementDomain;

/// Type of unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    // Assault force
    MarineSquad,
    ReconTeam,
    AntiArmorTeam,
    MortarTeam,
    AmphibiousVehicle,
    LandingCraft,
    AttackHelicopter,
    TransportHelicopter,
    StrikeFighter,
    AssaultShip,

    // Static defense
    InfantrySquad,
    MachineGunTeam,
    Tank,
    CoastalArtillery,
    AntiShipMissileTeam,
    AntiAirTeam,
    DecoyMarker,
}

/// Category tags used by targeting, cargo and visibility rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Infantry,
    Vehicle,
    Aircraft,
    Rotary,
    Ship,
    Artillery,
    IndirectFire,
    Recon,
    AirDefense,
    Transport,
    MobileBase,
    Decoy,
}

/// Static stat block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub movement: u32,
    /// Base attack dice
    pub attack: u32,
    /// Base hit threshold
    pub defense: u32,
    pub max_hp: u32,
    pub supply: Option<u32>,
    pub cost: u32,
}

/// Legal attack distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeRule {
    Within(u32),
    Unlimited,
    /// Minimum and maximum inclusive; excludes adjacency when min > 1
    Band { min: u32, max: u32 },
}

impl RangeRule {
    pub fn allows(&self, distance: u32) -> bool {
        match *self {
            RangeRule::Within(max) => distance <= max,
            RangeRule::Unlimited => true,
            RangeRule::Band { min, max } => (min..=max).contains(&distance),
        }
    }
}

/// What a transport will take aboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CargoAccepts {
    Nothing,
    /// Passenger must carry at least one of these tags
    AnyOf(&'static [Capability]),
    /// Anything with a deck class (the mobile base)
    DeckCapable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CargoSpec {
    pub capacity: usize,
    pub accepts: CargoAccepts,
}

impl CargoSpec {
    const NONE: CargoSpec = CargoSpec {
        capacity: 0,
        accepts: CargoAccepts::Nothing,
    };
}

/// Which part of the mobile base launches the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckClass {
    Flight,
    /// Heavy landing craft, one per turn
    WellHeavy,
    /// Light amphibious vehicles
    WellLight,
}

/// Condition under which an attack bonus applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusCondition {
    /// Target carries this tag
    TargetHas(Capability),
    /// Attacker moved this turn and the target is on the ground
    MovedVsGround,
    /// Target was revealed this turn
    TargetFreshlyRevealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackBonus {
    pub condition: BonusCondition,
    pub dice: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRestriction {
    Any,
    /// Aircraft and rotary only
    AirOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostEffect {
    None,
    /// A surviving target always ends with at least one suppression token
    AlwaysSuppress,
}

/// Everything the rules need to know about a unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitProfile {
    pub stats: UnitStats,
    pub capabilities: &'static [Capability],
    pub domain: MovementDomain,
    pub sight_range: u32,
    pub detection_range: u32,
    pub cargo: CargoSpec,
    pub deck: Option<DeckClass>,
    pub range: RangeRule,
    pub attack_bonuses: &'static [AttackBonus],
    pub target_restriction: TargetRestriction,
    pub post_effect: PostEffect,
    pub abilities: &'static [AbilityKind],
}

impl UnitProfile {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_airborne(&self) -> bool {
        self.has(Capability::Aircraft) || self.has(Capability::Rotary)
    }

    /// Not airborne and not afloat
    pub fn is_ground(&self) -> bool {
        !self.is_airborne() && !self.has(Capability::Ship)
    }

    /// Counts toward a side's active-unit total
    pub fn is_combatant(&self) -> bool {
        !self.has(Capability::Decoy)
    }

    /// Occupies enough space to block sight through its hex
    pub fn blocks_los(&self) -> bool {
        self.has(Capability::Vehicle) || self.has(Capability::Ship)
    }

    /// Ground units may hold objectives
    pub fn can_secure(&self) -> bool {
        self.domain.is_ground() && self.is_combatant()
    }

    /// Whether a passenger with `other` profile may ride in this unit
    pub fn accepts(&self, other: &UnitProfile) -> bool {
        match self.cargo.accepts {
            CargoAccepts::Nothing => false,
            CargoAccepts::AnyOf(tags) => tags.iter().any(|t| other.has(*t)),
            CargoAccepts::DeckCapable => other.deck.is_some(),
        }
    }

    /// Extra dice for an attack against `target`
    pub fn bonus_dice(&self, target: &UnitProfile, attacker_moved: bool, target_fresh: bool) -> u32 {
        self.attack_bonuses
            .iter()
            .filter(|b| match b.condition {
                BonusCondition::TargetHas(tag) => target.has(tag),
                BonusCondition::MovedVsGround => attacker_moved && target.is_ground(),
                BonusCondition::TargetFreshlyRevealed => target_fresh,
            })
            .map(|b| b.dice)
            .sum()
    }

    pub fn may_target(&self, target: &UnitProfile) -> bool {
        match self.target_restriction {
            TargetRestriction::Any => true,
            TargetRestriction::AirOnly => target.is_airborne(),
        }
    }
}

const fn stats(movement: u32, attack: u32, defense: u32, max_hp: u32, supply: Option<u32>, cost: u32) -> UnitStats {
    UnitStats {
        movement,
        attack,
        defense,
        max_hp,
        supply,
        cost,
    }
}

const INFANTRY_ONLY: &[Capability] = &[Capability::Infantry];
const INFANTRY_OR_VEHICLE: &[Capability] = &[Capability::Infantry, Capability::Vehicle];

const CLOSE_AIR_SUPPORT: &[AttackBonus] = &[AttackBonus {
    condition: BonusCondition::MovedVsGround,
    dice: 1,
}];

/// Shared shape for foot infantry
const fn foot(stats: UnitStats, capabilities: &'static [Capability]) -> UnitProfile {
    UnitProfile {
        stats,
        capabilities,
        domain: MovementDomain::Foot,
        sight_range: BASE_SIGHT_RANGE,
        detection_range: BASE_DETECTION_RANGE,
        cargo: CargoSpec::NONE,
        deck: None,
        range: RangeRule::Within(1),
        attack_bonuses: &[],
        target_restriction: TargetRestriction::Any,
        post_effect: PostEffect::None,
        abilities: &[],
    }
}

const fn air(stats: UnitStats, capabilities: &'static [Capability]) -> UnitProfile {
    UnitProfile {
        stats,
        capabilities,
        domain: MovementDomain::Air,
        sight_range: AIR_SIGHT_RANGE,
        detection_range: BASE_DETECTION_RANGE,
        cargo: CargoSpec::NONE,
        deck: Some(DeckClass::Flight),
        range: RangeRule::Within(3),
        attack_bonuses: CLOSE_AIR_SUPPORT,
        target_restriction: TargetRestriction::Any,
        post_effect: PostEffect::None,
        abilities: &[],
    }
}

impl UnitType {
    pub const ALL: [UnitType; 17] = [
        UnitType::MarineSquad,
        UnitType::ReconTeam,
        UnitType::AntiArmorTeam,
        UnitType::MortarTeam,
        UnitType::AmphibiousVehicle,
        UnitType::LandingCraft,
        UnitType::AttackHelicopter,
        UnitType::TransportHelicopter,
        UnitType::StrikeFighter,
        UnitType::AssaultShip,
        UnitType::InfantrySquad,
        UnitType::MachineGunTeam,
        UnitType::Tank,
        UnitType::CoastalArtillery,
        UnitType::AntiShipMissileTeam,
        UnitType::AntiAirTeam,
        UnitType::DecoyMarker,
    ];

    /// Side that fields this type in a standard order of battle
    pub fn side(&self) -> Side {
        match self {
            UnitType::MarineSquad
            | UnitType::ReconTeam
            | UnitType::AntiArmorTeam
            | UnitType::MortarTeam
            | UnitType::AmphibiousVehicle
            | UnitType::LandingCraft
            | UnitType::AttackHelicopter
            | UnitType::TransportHelicopter
            | UnitType::StrikeFighter
            | UnitType::AssaultShip => Side::Assault,
            _ => Side::Defense,
        }
    }

    /// Capability table entry for this type
    pub fn profile(&self) -> UnitProfile {
        match self {
            UnitType::MarineSquad => UnitProfile {
                abilities: &[AbilityKind::Rally, AbilityKind::Entrench],
                ..foot(stats(2, 3, 4, 3, Some(4), 3), INFANTRY_ONLY)
            },

            UnitType::ReconTeam => UnitProfile {
                detection_range: RECON_DETECTION_RANGE,
                attack_bonuses: &[AttackBonus {
                    condition: BonusCondition::TargetFreshlyRevealed,
                    dice: 1,
                }],
                abilities: &[AbilityKind::Conceal],
                ..foot(
                    stats(3, 2, 4, 2, Some(3), 2),
                    &[Capability::Infantry, Capability::Recon],
                )
            },

            UnitType::AntiArmorTeam => UnitProfile {
                attack_bonuses: &[AttackBonus {
                    condition: BonusCondition::TargetHas(Capability::Vehicle),
                    dice: 2,
                }],
                ..foot(stats(2, 2, 4, 2, Some(3), 3), INFANTRY_ONLY)
            },

            UnitType::MortarTeam => UnitProfile {
                range: RangeRule::Band { min: 2, max: 4 },
                post_effect: PostEffect::AlwaysSuppress,
                abilities: &[AbilityKind::SmokeScreen, AbilityKind::Barrage],
                ..foot(
                    stats(1, 2, 4, 2, Some(4), 3),
                    &[Capability::Infantry, Capability::Artillery, Capability::IndirectFire],
                )
            },

            UnitType::AmphibiousVehicle => UnitProfile {
                domain: MovementDomain::Amphibious,
                cargo: CargoSpec {
                    capacity: 2,
                    accepts: CargoAccepts::AnyOf(INFANTRY_ONLY),
                },
                deck: Some(DeckClass::WellLight),
                ..foot(
                    stats(3, 2, 3, 3, Some(5), 4),
                    &[Capability::Vehicle, Capability::Transport],
                )
            },

            UnitType::LandingCraft => UnitProfile {
                domain: MovementDomain::Amphibious,
                cargo: CargoSpec {
                    capacity: 3,
                    accepts: CargoAccepts::AnyOf(INFANTRY_OR_VEHICLE),
                },
                deck: Some(DeckClass::WellHeavy),
                ..foot(
                    stats(3, 0, 3, 4, None, 4),
                    &[Capability::Vehicle, Capability::Transport],
                )
            },

            UnitType::AttackHelicopter => air(stats(4, 3, 4, 2, Some(3), 5), &[Capability::Rotary]),

            UnitType::TransportHelicopter => UnitProfile {
                cargo: CargoSpec {
                    capacity: 2,
                    accepts: CargoAccepts::AnyOf(INFANTRY_ONLY),
                },
                ..air(
                    stats(4, 0, 4, 2, None, 4),
                    &[Capability::Rotary, Capability::Transport],
                )
            },

            UnitType::StrikeFighter => air(stats(6, 4, 4, 2, Some(2), 6), &[Capability::Aircraft]),

            UnitType::AssaultShip => UnitProfile {
                domain: MovementDomain::Naval,
                sight_range: SHIP_SIGHT_RANGE,
                cargo: CargoSpec {
                    capacity: 8,
                    accepts: CargoAccepts::DeckCapable,
                },
                range: RangeRule::Within(3),
                ..foot(
                    stats(2, 2, 3, 10, None, 0),
                    &[Capability::Ship, Capability::MobileBase, Capability::Transport],
                )
            },

            UnitType::InfantrySquad => UnitProfile {
                abilities: &[AbilityKind::Rally, AbilityKind::Entrench, AbilityKind::Conceal],
                ..foot(stats(1, 3, 4, 3, None, 2), INFANTRY_ONLY)
            },

            UnitType::MachineGunTeam => UnitProfile {
                abilities: &[AbilityKind::Entrench, AbilityKind::Conceal],
                ..foot(stats(1, 4, 4, 2, None, 3), INFANTRY_ONLY)
            },

            UnitType::Tank => UnitProfile {
                domain: MovementDomain::Tracked,
                ..foot(stats(2, 4, 5, 4, None, 5), &[Capability::Vehicle])
            },

            UnitType::CoastalArtillery => UnitProfile {
                domain: MovementDomain::Static,
                range: RangeRule::Unlimited,
                post_effect: PostEffect::AlwaysSuppress,
                ..foot(
                    stats(0, 3, 5, 3, None, 5),
                    &[Capability::Artillery, Capability::IndirectFire],
                )
            },

            // Area-denial team; its band overlaps the air-defense reach at 2-3
            UnitType::AntiShipMissileTeam => UnitProfile {
                range: RangeRule::Band { min: 2, max: 5 },
                abilities: &[AbilityKind::Conceal],
                ..foot(stats(1, 3, 4, 2, None, 4), INFANTRY_ONLY)
            },

            UnitType::AntiAirTeam => UnitProfile {
                range: RangeRule::Within(3),
                target_restriction: TargetRestriction::AirOnly,
                abilities: &[AbilityKind::Conceal],
                ..foot(
                    stats(1, 3, 4, 2, None, 3),
                    &[Capability::Infantry, Capability::AirDefense],
                )
            },

            UnitType::DecoyMarker => UnitProfile {
                domain: MovementDomain::Static,
                ..foot(stats(0, 0, 1, 1, None, 1), &[Capability::Decoy])
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sight_ranges_by_category() {
        assert_eq!(UnitType::MarineSquad.profile().sight_range, 4);
        assert_eq!(UnitType::StrikeFighter.profile().sight_range, 8);
        assert_eq!(UnitType::AttackHelicopter.profile().sight_range, 8);
        assert_eq!(UnitType::AssaultShip.profile().sight_range, 10);
    }

    #[test]
    fn test_range_table() {
        assert!(UnitType::MarineSquad.profile().range.allows(1));
        assert!(!UnitType::MarineSquad.profile().range.allows(2));
        assert!(UnitType::StrikeFighter.profile().range.allows(3));
        assert!(UnitType::CoastalArtillery.profile().range.allows(40));

        let mortar = UnitType::MortarTeam.profile().range;
        assert!(!mortar.allows(1));
        assert!(mortar.allows(2));
        assert!(mortar.allows(4));
        assert!(!mortar.allows(5));
    }

    #[test]
    fn test_cargo_compatibility() {
        let aav = UnitType::AmphibiousVehicle.profile();
        let marines = UnitType::MarineSquad.profile();
        let tank = UnitType::Tank.profile();
        let lcac = UnitType::LandingCraft.profile();

        assert!(aav.accepts(&marines));
        assert!(!aav.accepts(&tank));
        assert!(lcac.accepts(&tank));
        assert_eq!(aav.cargo.capacity, 2);
    }

    #[test]
    fn test_mobile_base_accepts_deck_units() {
        let ship = UnitType::AssaultShip.profile();
        assert!(ship.accepts(&UnitType::StrikeFighter.profile()));
        assert!(ship.accepts(&UnitType::LandingCraft.profile()));
        assert!(!ship.accepts(&UnitType::MarineSquad.profile()));
    }

    #[test]
    fn test_anti_armor_bonus_vs_vehicle() {
        let at = UnitType::AntiArmorTeam.profile();
        assert_eq!(at.bonus_dice(&UnitType::Tank.profile(), false, false), 2);
        assert_eq!(at.bonus_dice(&UnitType::InfantrySquad.profile(), false, false), 0);
    }

    #[test]
    fn test_close_air_support_requires_movement() {
        let helo = UnitType::AttackHelicopter.profile();
        let target = UnitType::InfantrySquad.profile();
        assert_eq!(helo.bonus_dice(&target, false, false), 0);
        assert_eq!(helo.bonus_dice(&target, true, false), 1);
        // Not against other aircraft
        assert_eq!(helo.bonus_dice(&UnitType::StrikeFighter.profile(), true, false), 0);
    }

    #[test]
    fn test_air_defense_targets_air_only() {
        let aa = UnitType::AntiAirTeam.profile();
        assert!(aa.may_target(&UnitType::TransportHelicopter.profile()));
        assert!(!aa.may_target(&UnitType::MarineSquad.profile()));
    }

    #[test]
    fn test_sides() {
        assert_eq!(UnitType::AssaultShip.side(), Side::Assault);
        assert_eq!(UnitType::DecoyMarker.side(), Side::Defense);
        assert!(!UnitType::DecoyMarker.profile().is_combatant());
    }

    #[test]
    fn test_every_profile_is_consistent() {
        for unit_type in UnitType::ALL {
            let p = unit_type.profile();
            assert!(p.stats.max_hp > 0, "{:?}", unit_type);
            assert!(p.sight_range >= 1);
            assert_eq!(p.cargo.capacity == 0, p.cargo.accepts == CargoAccepts::Nothing);
        }
    }
}
