//! Per-player visibility (fog of war)
//!
//! Each player has its own record of visible units, explored hexes and
//! last-known enemy positions. The visible set is rebuilt from scratch on
//! every recompute; explored hexes and last-known positions only grow or
//! get overwritten.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::{MIN_SIGHT_RANGE, SUPPRESSED_SIGHT_PENALTY};
use crate::battle::hex::{line_of_sight, HexCoord};
use crate::battle::player::Player;
use crate::battle::units::Unit;
use crate::core::types::{PlayerId, Turn, UnitId};

/// Where an enemy unit was last seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastKnown {
    pub position: HexCoord,
    pub turn: Turn,
}

/// Visibility state for one player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRecord {
    /// Own living units plus currently observed enemies
    pub visible_units: BTreeSet<UnitId>,
    /// Every hex any friendly observer has had in view
    pub explored: BTreeSet<HexCoord>,
    pub last_known: BTreeMap<UnitId, LastKnown>,
}

impl VisibilityRecord {
    pub fn is_visible(&self, unit: UnitId) -> bool {
        self.visible_units.contains(&unit)
    }

    pub fn is_explored(&self, coord: HexCoord) -> bool {
        self.explored.contains(&coord)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilitySystem {
    records: BTreeMap<PlayerId, VisibilityRecord>,
}

impl VisibilitySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, player: PlayerId) -> Option<&VisibilityRecord> {
        self.records.get(&player)
    }

    pub fn is_visible(&self, player: PlayerId, unit: UnitId) -> bool {
        self.record(player).is_some_and(|r| r.is_visible(unit))
    }

    /// Rebuild every player's visible set for the current positions
    pub fn recompute(&mut self, map: &BattleMap, players: &BTreeMap<PlayerId, Player>, turn: Turn) {
        let blockers = unit_blockers(players.values());

        for player in players.values() {
            let record = self.records.entry(player.id).or_default();
            record.visible_units.clear();

            let observers: Vec<&Unit> = player.living_units().collect();
            for unit in &observers {
                record.visible_units.insert(unit.id);
            }

            let on_map: Vec<&&Unit> = observers.iter().filter(|u| !u.is_embarked()).collect();

            for observer in &on_map {
                let sight = sight_range(observer);
                for hex in observer.position.range(sight) {
                    if map.contains(hex) && clear_line(map, &blockers, observer.position, hex) {
                        record.explored.insert(hex);
                    }
                }
            }

            let enemies = players
                .values()
                .filter(|p| p.side != player.side)
                .flat_map(|p| p.living_units())
                .filter(|u| !u.is_embarked());

            for target in enemies {
                let seen = on_map
                    .iter()
                    .any(|observer| observes(map, &blockers, observer, target));
                if seen {
                    record.visible_units.insert(target.id);
                    record.last_known.insert(
                        target.id,
                        LastKnown {
                            position: target.position,
                            turn,
                        },
                    );
                }
            }
        }
    }
}

/// Sight range after suppression, never below the floor
pub fn sight_range(unit: &Unit) -> u32 {
    let base = unit.profile().sight_range;
    if unit.suppression() > 0 {
        base.saturating_sub(SUPPRESSED_SIGHT_PENALTY).max(MIN_SIGHT_RANGE)
    } else {
        base
    }
}

/// Whether `observer` is close enough to pick out a hidden `target`
pub fn can_detect(observer: &Unit, target: &Unit) -> bool {
    observer.position.distance(&target.position) <= observer.profile().detection_range
}

/// Hexes occupied by living, unembarked vehicles and ships
pub fn unit_blockers<'a>(players: impl Iterator<Item = &'a Player>) -> AHashSet<HexCoord> {
    players
        .flat_map(|p| p.living_units())
        .filter(|u| !u.is_embarked() && u.profile().blocks_los())
        .map(|u| u.position)
        .collect()
}

/// LOS through terrain, fortifications, smoke and blocking units
pub fn clear_line(map: &BattleMap, blockers: &AHashSet<HexCoord>, from: HexCoord, to: HexCoord) -> bool {
    line_of_sight(from, to, |hex| map.blocks_los(hex) || blockers.contains(&hex))
}

/// Full visibility test for one observer/target pair
pub fn observes(map: &BattleMap, blockers: &AHashSet<HexCoord>, observer: &Unit, target: &Unit) -> bool {
    if target.is_hidden() && !can_detect(observer, target) {
        return false;
    }
    observer.position.distance(&target.position) <= sight_range(observer)
        && clear_line(map, blockers, observer.position, target.position)
}
