//! Unit entity: static stats plus mutable battlefield state
//!
//! Units are created once at deployment and never removed. Destruction is
//! HP 0; destroyed units stay addressable by id.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::battle::abilities::{AbilityKind, AbilityState};
use crate::battle::constants::MAX_SUPPRESSION;
use crate::battle::hex::HexCoord;
use crate::battle::player::Side;
use crate::battle::terrain::MovementDomain;
use crate::battle::unit_type::{Capability, UnitProfile, UnitStats, UnitType};
use crate::core::error::RuleViolation;
use crate::core::types::{PlayerId, UnitId};

/// Status flags carried by a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusFlag {
    Hidden,
    Decoy,
    Suppressed,
    Pinned,
    Entrenched,
    Embarked,
    /// Revealed during the current turn
    FreshlyRevealed,
}

/// A combat unit on the battlefield
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitType,
    pub owner: PlayerId,
    pub side: Side,
    pub stats: UnitStats,
    pub abilities: Vec<AbilityState>,

    pub position: HexCoord,
    pub hp: u32,
    pub supply: Option<u32>,
    status: BTreeSet<StatusFlag>,
    suppression: u8,
    pub has_acted: bool,
    pub has_moved: bool,
    pub carried_by: Option<UnitId>,
    pub cargo: Vec<UnitId>,
}

impl Unit {
    /// Fresh unit at full HP and supply
    pub fn new(id: UnitId, unit_type: UnitType, owner: PlayerId, position: HexCoord) -> Self {
        let profile = unit_type.profile();
        let mut status = BTreeSet::new();
        if profile.has(Capability::Decoy) {
            status.insert(StatusFlag::Decoy);
        }

        Self {
            id,
            unit_type,
            owner,
            side: unit_type.side(),
            stats: profile.stats,
            abilities: profile.abilities.iter().map(|k| AbilityState::new(*k)).collect(),
            position,
            hp: profile.stats.max_hp,
            supply: profile.stats.supply,
            status,
            suppression: 0,
            has_acted: false,
            has_moved: false,
            carried_by: None,
            cargo: Vec::new(),
        }
    }

    pub fn profile(&self) -> UnitProfile {
        self.unit_type.profile()
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_embarked(&self) -> bool {
        self.carried_by.is_some()
    }

    /// Alive, not yet acted, not pinned and not riding in a transport
    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.has_acted && self.suppression < MAX_SUPPRESSION && !self.is_embarked()
    }

    /// `can_act` with the reason it fails
    pub fn check_ready(&self) -> Result<(), RuleViolation> {
        if !self.is_alive() {
            return Err(RuleViolation::UnitDestroyed(self.id));
        }
        if self.is_embarked() {
            return Err(RuleViolation::UnitEmbarked(self.id));
        }
        if self.has_acted {
            return Err(RuleViolation::AlreadyActed(self.id));
        }
        if self.suppression >= MAX_SUPPRESSION {
            return Err(RuleViolation::UnitPinned(self.id));
        }
        Ok(())
    }

    pub fn can_move(&self) -> bool {
        let profile = self.profile();
        self.can_act()
            && !self.has_moved
            && profile.stats.movement > 0
            && profile.domain != MovementDomain::Static
    }

    /// Reduce HP by `damage`, saturating at 0. A survivor of a non-zero
    /// hit gains one suppression token. Returns HP actually lost.
    pub fn apply_damage(&mut self, damage: u32) -> u32 {
        let lost = damage.min(self.hp);
        self.hp -= lost;
        if damage > 0 && self.is_alive() {
            self.add_suppression(1);
        }
        lost
    }

    pub fn suppression(&self) -> u8 {
        self.suppression
    }

    /// Add tokens, capped at pinned
    pub fn add_suppression(&mut self, tokens: u8) {
        self.set_suppression(self.suppression.saturating_add(tokens));
    }

    pub fn remove_suppression(&mut self, tokens: u8) {
        self.set_suppression(self.suppression.saturating_sub(tokens));
    }

    /// Set the token count and keep the Suppressed/Pinned flags in step
    pub fn set_suppression(&mut self, tokens: u8) {
        self.suppression = tokens.min(MAX_SUPPRESSION);
        self.status.remove(&StatusFlag::Suppressed);
        self.status.remove(&StatusFlag::Pinned);
        match self.suppression {
            0 => {}
            1 => {
                self.status.insert(StatusFlag::Suppressed);
            }
            _ => {
                self.status.insert(StatusFlag::Pinned);
            }
        }
    }

    /// Spend one supply point. Units without a supply stat always succeed;
    /// an empty supply only warns.
    pub fn consume_supply(&mut self) -> bool {
        match self.supply.as_mut() {
            None => true,
            Some(0) => {
                warn!(unit = %self.id, "supply exhausted");
                false
            }
            Some(s) => {
                *s -= 1;
                true
            }
        }
    }

    /// Start-of-turn reset of per-turn flags
    pub fn reset_for_turn(&mut self) {
        self.has_acted = false;
        self.has_moved = false;
        self.status.remove(&StatusFlag::FreshlyRevealed);
    }

    pub fn status(&self) -> &BTreeSet<StatusFlag> {
        &self.status
    }

    pub fn has_status(&self, flag: StatusFlag) -> bool {
        self.status.contains(&flag)
    }

    /// Flags that are not derived from suppression or cargo links
    pub fn set_flag(&mut self, flag: StatusFlag, on: bool) {
        match flag {
            StatusFlag::Suppressed | StatusFlag::Pinned | StatusFlag::Embarked => {}
            _ if on => {
                self.status.insert(flag);
            }
            _ => {
                self.status.remove(&flag);
            }
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.has_status(StatusFlag::Hidden) || self.has_status(StatusFlag::Decoy)
    }

    pub fn is_decoy(&self) -> bool {
        self.profile().has(Capability::Decoy)
    }

    pub fn is_entrenched(&self) -> bool {
        self.has_status(StatusFlag::Entrenched)
    }

    pub fn hide(&mut self) {
        self.status.insert(StatusFlag::Hidden);
    }

    /// Clear Hidden/Decoy and mark freshly revealed; returns whether the
    /// unit was hidden before
    pub fn reveal(&mut self) -> bool {
        let was_hidden = self.is_hidden();
        self.status.remove(&StatusFlag::Hidden);
        self.status.remove(&StatusFlag::Decoy);
        if was_hidden {
            self.status.insert(StatusFlag::FreshlyRevealed);
        }
        was_hidden
    }

    /// Destroy outright (exposed decoys)
    pub fn destroy(&mut self) {
        self.hp = 0;
    }

    pub fn embark(&mut self, transport: UnitId, position: HexCoord) {
        self.carried_by = Some(transport);
        self.position = position;
        self.status.insert(StatusFlag::Embarked);
        self.status.remove(&StatusFlag::Entrenched);
    }

    pub fn disembark(&mut self, position: HexCoord) {
        self.carried_by = None;
        self.position = position;
        self.status.remove(&StatusFlag::Embarked);
    }

    pub fn cargo_capacity(&self) -> usize {
        self.profile().cargo.capacity
    }

    pub fn cargo_space(&self) -> usize {
        self.cargo_capacity().saturating_sub(self.cargo.len())
    }

    /// Type compatibility only; capacity is checked separately
    pub fn can_carry(&self, passenger: &Unit) -> bool {
        self.id != passenger.id && self.profile().accepts(&passenger.profile())
    }

    pub fn ability(&self, kind: AbilityKind) -> Option<&AbilityState> {
        self.abilities.iter().find(|a| a.kind == kind)
    }

    pub fn ability_mut(&mut self, kind: AbilityKind) -> Option<&mut AbilityState> {
        self.abilities.iter_mut().find(|a| a.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marines() -> Unit {
        Unit::new(UnitId(1), UnitType::MarineSquad, PlayerId(1), HexCoord::new(0, 0))
    }

    #[test]
    fn test_new_unit_full_strength() {
        let unit = marines();
        assert_eq!(unit.hp, unit.stats.max_hp);
        assert_eq!(unit.supply, unit.stats.supply);
        assert_eq!(unit.side, Side::Assault);
        assert!(unit.can_act());
        assert!(unit.can_move());
    }

    #[test]
    fn test_damage_suppresses_survivor() {
        let mut unit = marines();
        assert_eq!(unit.apply_damage(1), 1);
        assert_eq!(unit.hp, 2);
        assert_eq!(unit.suppression(), 1);
        assert!(unit.has_status(StatusFlag::Suppressed));
    }

    #[test]
    fn test_zero_damage_no_suppression() {
        let mut unit = marines();
        unit.apply_damage(0);
        assert_eq!(unit.suppression(), 0);
    }

    #[test]
    fn test_lethal_damage_saturates() {
        let mut unit = marines();
        assert_eq!(unit.apply_damage(10), 3);
        assert_eq!(unit.hp, 0);
        assert!(!unit.is_alive());
        assert!(!unit.can_act());
    }

    #[test]
    fn test_pinned_clears_suppressed_flag() {
        let mut unit = marines();
        unit.add_suppression(1);
        unit.add_suppression(1);
        assert_eq!(unit.suppression(), 2);
        assert!(unit.has_status(StatusFlag::Pinned));
        assert!(!unit.has_status(StatusFlag::Suppressed));
        assert!(!unit.can_act());

        unit.add_suppression(1);
        assert_eq!(unit.suppression(), 2);

        unit.remove_suppression(1);
        assert!(unit.has_status(StatusFlag::Suppressed));
        assert!(!unit.has_status(StatusFlag::Pinned));
    }

    #[test]
    fn test_supply_is_advisory() {
        let mut unit = marines();
        unit.supply = Some(1);
        assert!(unit.consume_supply());
        assert!(!unit.consume_supply());
        assert_eq!(unit.supply, Some(0));

        let mut tank = Unit::new(UnitId(2), UnitType::Tank, PlayerId(2), HexCoord::new(1, 0));
        assert!(tank.consume_supply());
    }

    #[test]
    fn test_reveal_marks_fresh() {
        let mut unit = marines();
        assert!(!unit.reveal());
        unit.hide();
        assert!(unit.is_hidden());
        assert!(unit.reveal());
        assert!(!unit.is_hidden());
        assert!(unit.has_status(StatusFlag::FreshlyRevealed));
        unit.reset_for_turn();
        assert!(!unit.has_status(StatusFlag::FreshlyRevealed));
    }

    #[test]
    fn test_decoy_starts_hidden() {
        let decoy = Unit::new(UnitId(9), UnitType::DecoyMarker, PlayerId(2), HexCoord::new(3, 3));
        assert!(decoy.is_hidden());
        assert!(decoy.is_decoy());
        assert!(!decoy.can_move());
    }

    #[test]
    fn test_embarked_cannot_act() {
        let mut unit = marines();
        unit.embark(UnitId(5), HexCoord::new(1, 1));
        assert!(unit.has_status(StatusFlag::Embarked));
        assert!(!unit.can_act());
        unit.disembark(HexCoord::new(2, 1));
        assert!(unit.can_act());
        assert_eq!(unit.position, HexCoord::new(2, 1));
    }

    #[test]
    fn test_cargo_space() {
        let mut aav = Unit::new(UnitId(3), UnitType::AmphibiousVehicle, PlayerId(1), HexCoord::new(0, 0));
        assert_eq!(aav.cargo_space(), 2);
        assert!(aav.can_carry(&marines()));
        aav.cargo.push(UnitId(1));
        assert_eq!(aav.cargo_space(), 1);
    }

    #[test]
    fn test_derived_flags_not_settable() {
        let mut unit = marines();
        unit.set_flag(StatusFlag::Pinned, true);
        assert!(!unit.has_status(StatusFlag::Pinned));
        unit.set_flag(StatusFlag::Entrenched, true);
        assert!(unit.is_entrenched());
    }
}
