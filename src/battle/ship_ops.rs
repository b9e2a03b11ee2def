//! Mobile base operations: tiered degradation, launch capacity and ammo
//!
//! Hull integrity drives every subsystem tier. Launch counters reset each
//! turn; the ammunition pool does not. Capacity checks are read-only and
//! counters change only through `commit_launch`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    C2_CP_DEGRADED, C2_CP_OPERATIONAL, HULL_DEGRADED_PCT, HULL_LIMITED_PCT,
    HULL_OPERATIONAL_PCT, LAUNCHES_OPERATIONAL, LAUNCHES_REDUCED,
};
use crate::battle::dice::DiceRoller;
use crate::battle::unit_type::DeckClass;
use crate::core::error::RuleViolation;
use crate::core::types::UnitId;

/// Functional state of one shipboard system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemStatus {
    Operational,
    Degraded,
    Limited,
    Damaged,
    Offline,
}

impl SystemStatus {
    /// Launches per turn a deck in this state can handle
    pub fn launch_capacity(&self) -> u32 {
        match self {
            SystemStatus::Operational => LAUNCHES_OPERATIONAL,
            SystemStatus::Degraded | SystemStatus::Limited => LAUNCHES_REDUCED,
            SystemStatus::Damaged | SystemStatus::Offline => 0,
        }
    }

    /// Command points produced by command-and-control in this state
    pub fn command_points(&self) -> u32 {
        match self {
            SystemStatus::Operational => C2_CP_OPERATIONAL,
            SystemStatus::Degraded | SystemStatus::Limited => C2_CP_DEGRADED,
            SystemStatus::Damaged | SystemStatus::Offline => 0,
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Status of all three systems at one hull level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipStatus {
    pub flight_deck: SystemStatus,
    pub well_deck: SystemStatus,
    pub command_and_control: SystemStatus,
}

impl ShipStatus {
    /// Tier for a hull reading; percentages compare strictly greater-than
    pub fn from_hull(hull: u32, max_hull: u32) -> Self {
        use SystemStatus::*;

        let (decks, c2) = if hull == 0 || max_hull == 0 {
            (Offline, Offline)
        } else {
            let scaled = hull as u64 * 100;
            let max = max_hull as u64;
            if scaled > HULL_OPERATIONAL_PCT as u64 * max {
                (Operational, Operational)
            } else if scaled > HULL_DEGRADED_PCT as u64 * max {
                (Operational, Degraded)
            } else if scaled > HULL_LIMITED_PCT as u64 * max {
                (Limited, Degraded)
            } else {
                (Damaged, Offline)
            }
        };

        Self {
            flight_deck: decks,
            well_deck: decks,
            command_and_control: c2,
        }
    }
}

/// What the well deck has been used for this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WellDeckMode {
    Heavy,
    Light,
}

/// Counted launch request, produced by `check_launch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaunchPlan {
    pub flight: u32,
    pub well_heavy: u32,
    pub well_light: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefenseRoll {
    pub rolls: Vec<u8>,
    pub successes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipOperations {
    /// The ship unit this record tracks
    pub ship_id: UnitId,
    hull: u32,
    max_hull: u32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub flight_launches: u32,
    pub well_launches: u32,
    pub well_mode: Option<WellDeckMode>,
}

impl ShipOperations {
    pub fn new(ship_id: UnitId, max_hull: u32, ammo: u32, max_ammo: u32) -> Self {
        Self {
            ship_id,
            hull: max_hull,
            max_hull,
            ammo: ammo.min(max_ammo),
            max_ammo,
            flight_launches: 0,
            well_launches: 0,
            well_mode: None,
        }
    }

    pub fn hull(&self) -> u32 {
        self.hull
    }

    pub fn max_hull(&self) -> u32 {
        self.max_hull
    }

    /// Follow the ship unit's HP; returns the status if it changed
    pub fn set_hull(&mut self, hull: u32) -> Option<ShipStatus> {
        let before = self.status();
        self.hull = hull.min(self.max_hull);
        let after = self.status();
        (before != after).then_some(after)
    }

    pub fn status(&self) -> ShipStatus {
        ShipStatus::from_hull(self.hull, self.max_hull)
    }

    pub fn is_destroyed(&self) -> bool {
        self.hull == 0
    }

    pub fn command_points(&self) -> u32 {
        self.status().command_and_control.command_points()
    }

    pub fn flight_remaining(&self) -> u32 {
        self.status()
            .flight_deck
            .launch_capacity()
            .saturating_sub(self.flight_launches)
    }

    pub fn well_light_remaining(&self) -> u32 {
        if self.well_mode == Some(WellDeckMode::Heavy) {
            return 0;
        }
        self.status()
            .well_deck
            .launch_capacity()
            .saturating_sub(self.well_launches)
    }

    pub fn well_heavy_remaining(&self) -> u32 {
        if self.well_mode.is_some() || self.status().well_deck.launch_capacity() == 0 {
            return 0;
        }
        1
    }

    /// Validate a batch of launches without touching any counter
    pub fn check_launch(&self, decks: &[DeckClass]) -> Result<LaunchPlan, RuleViolation> {
        let mut plan = LaunchPlan::default();
        for deck in decks {
            match deck {
                DeckClass::Flight => plan.flight += 1,
                DeckClass::WellHeavy => plan.well_heavy += 1,
                DeckClass::WellLight => plan.well_light += 1,
            }
        }

        let heavy_used = self.well_mode == Some(WellDeckMode::Heavy);
        let light_used = self.well_mode == Some(WellDeckMode::Light);
        if (plan.well_heavy > 0 && (plan.well_light > 0 || light_used))
            || (plan.well_light > 0 && heavy_used)
        {
            return Err(RuleViolation::WellDeckModeConflict);
        }

        for (deck, requested, available) in [
            ("flight deck", plan.flight, self.flight_remaining()),
            ("well deck", plan.well_heavy, self.well_heavy_remaining()),
            ("well deck", plan.well_light, self.well_light_remaining()),
        ] {
            if requested > available {
                return Err(RuleViolation::LaunchCapacityExceeded {
                    deck,
                    requested,
                    available,
                });
            }
        }

        Ok(plan)
    }

    /// Apply a plan previously returned by `check_launch`
    pub fn commit_launch(&mut self, plan: &LaunchPlan) {
        self.flight_launches += plan.flight;
        if plan.well_heavy > 0 {
            self.well_launches += plan.well_heavy;
            self.well_mode = Some(WellDeckMode::Heavy);
        } else if plan.well_light > 0 {
            self.well_launches += plan.well_light;
            self.well_mode = Some(WellDeckMode::Light);
        }
    }

    /// New-turn reset of launch counters; ammo carries over
    pub fn reset_turn(&mut self) {
        self.flight_launches = 0;
        self.well_launches = 0;
        self.well_mode = None;
    }

    pub fn check_ammo(&self) -> Result<(), RuleViolation> {
        if self.ammo == 0 {
            return Err(RuleViolation::NoAmmo);
        }
        Ok(())
    }

    /// Reactive salvo against `incoming` hits. Consumes one round whatever
    /// the outcome; successes are capped at the incoming count.
    pub fn point_defense(
        &mut self,
        incoming: u32,
        dice: u32,
        threshold: u8,
        roller: &mut impl DiceRoller,
    ) -> Result<DefenseRoll, RuleViolation> {
        self.check_ammo()?;
        self.ammo -= 1;
        let rolls = roller.roll_many(dice);
        let successes = (rolls.iter().filter(|&&r| r >= threshold).count() as u32).min(incoming);
        Ok(DefenseRoll { rolls, successes })
    }

    /// Guided intercept; consumes one round, returns the hits scored
    pub fn intercept(
        &mut self,
        dice: u32,
        threshold: u8,
        roller: &mut impl DiceRoller,
    ) -> Result<DefenseRoll, RuleViolation> {
        self.check_ammo()?;
        self.ammo -= 1;
        let rolls = roller.roll_many(dice);
        let successes = rolls.iter().filter(|&&r| r >= threshold).count() as u32;
        Ok(DefenseRoll { rolls, successes })
    }

    /// Add rounds up to the magazine size; returns rounds actually added
    pub fn resupply(&mut self, amount: u32) -> u32 {
        let before = self.ammo;
        self.ammo = (self.ammo + amount).min(self.max_ammo);
        self.ammo - before
    }
}
