//! Battle map with hex grid, terrain, objectives and fortifications
//!
//! The map is loaded from an externally authored `MapLayout`; the engine
//! only mutates objective control and smoke during play.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::battle::hex::{line_of_sight, HexCoord};
use crate::battle::terrain::{hex_entry_cost, MovementDomain, Terrain, TerrainFeature};
use crate::core::error::{EngineError, Result};
use crate::core::types::{FortificationId, ObjectiveId, PlayerId};

/// Whether an objective counts toward the attacker's win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    #[default]
    Primary,
    Secondary,
}

/// Objective placed on a map cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveMarker {
    pub id: ObjectiveId,
    pub kind: ObjectiveKind,
    pub name: String,
    /// Player currently holding the objective, by id only
    pub controller: Option<PlayerId>,
}

/// A single hex on the battle map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapCell {
    pub coord: HexCoord,
    pub terrain: Terrain,
    pub elevation: i8,
    pub features: Vec<TerrainFeature>,
    pub objective: Option<ObjectiveMarker>,
}

impl MapCell {
    pub fn new(coord: HexCoord, terrain: Terrain) -> Self {
        Self {
            coord,
            terrain,
            elevation: 0,
            features: Vec::new(),
            objective: None,
        }
    }

    /// Cover from terrain and features
    pub fn cover(&self) -> u32 {
        self.terrain.cover() + self.features.iter().map(|f| f.cover()).sum::<u32>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FortificationKind {
    Bunker,
    Trench,
    Wire,
    Pillbox,
    Seawall,
}

impl FortificationKind {
    /// (defense bonus, movement penalty, blocks LOS)
    pub fn default_stats(&self) -> (u32, u32, bool) {
        match self {
            FortificationKind::Bunker => (2, 0, true),
            FortificationKind::Trench => (1, 1, false),
            FortificationKind::Wire => (0, 2, false),
            FortificationKind::Pillbox => (2, 0, true),
            FortificationKind::Seawall => (1, 1, false),
        }
    }
}

/// Prepared defensive work, owned by the map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fortification {
    pub id: FortificationId,
    pub kind: FortificationKind,
    pub position: HexCoord,
    pub defense_bonus: u32,
    pub movement_penalty: u32,
    pub blocks_los: bool,
}

/// The full battle map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleMap {
    cells: BTreeMap<HexCoord, MapCell>,
    fortifications: Vec<Fortification>,
    smoke: BTreeSet<HexCoord>,
}

impl BattleMap {
    /// Parallelogram of clear terrain, axial q in 0..width, r in 0..height
    pub fn new(width: u32, height: u32) -> Self {
        let mut map = Self::empty();
        for q in 0..width as i32 {
            for r in 0..height as i32 {
                map.insert_cell(HexCoord::new(q, r), Terrain::Clear);
            }
        }
        map
    }

    /// Hexagon of clear terrain centered on the origin
    pub fn hexagon(radius: u32) -> Self {
        let mut map = Self::empty();
        for coord in HexCoord::ORIGIN.range(radius) {
            map.insert_cell(coord, Terrain::Clear);
        }
        map
    }

    /// Build a map from an authored layout
    pub fn from_layout(layout: &MapLayout) -> Result<Self> {
        let mut map = match layout.shape {
            MapShape::Parallelogram { width, height } => Self::new(width, height),
            MapShape::Hexagon { radius } => Self::hexagon(radius),
        };

        if layout.default_terrain != Terrain::Clear {
            for cell in map.cells.values_mut() {
                cell.terrain = layout.default_terrain;
            }
        }

        for entry in &layout.cells {
            let cell = map.cell_mut_for_layout(entry.at, "cell")?;
            if let Some(terrain) = entry.terrain {
                cell.terrain = terrain;
            }
            if let Some(elevation) = entry.elevation {
                cell.elevation = elevation;
            }
            for feature in &entry.features {
                if !cell.features.contains(feature) {
                    cell.features.push(*feature);
                }
            }
        }

        let mut seen = BTreeSet::new();
        for objective in &layout.objectives {
            if !seen.insert(objective.id) {
                return Err(EngineError::InvalidScenario(format!(
                    "{} defined twice",
                    objective.id
                )));
            }
            let cell = map.cell_mut_for_layout(objective.at, "objective")?;
            if cell.objective.is_some() {
                return Err(EngineError::InvalidScenario(format!(
                    "two objectives on {}",
                    objective.at
                )));
            }
            cell.objective = Some(ObjectiveMarker {
                id: objective.id,
                kind: objective.kind,
                name: objective.name.clone(),
                controller: None,
            });
        }

        for fort in &layout.fortifications {
            map.cell_mut_for_layout(fort.at, "fortification")?;
            let id = map.add_fortification(fort.kind, fort.at);
            if let Some(f) = map.fortifications.iter_mut().find(|f| f.id == id) {
                if let Some(bonus) = fort.defense_bonus {
                    f.defense_bonus = bonus;
                }
                if let Some(penalty) = fort.movement_penalty {
                    f.movement_penalty = penalty;
                }
                if let Some(blocks) = fort.blocks_los {
                    f.blocks_los = blocks;
                }
            }
        }

        Ok(map)
    }

    fn empty() -> Self {
        Self {
            cells: BTreeMap::new(),
            fortifications: Vec::new(),
            smoke: BTreeSet::new(),
        }
    }

    fn insert_cell(&mut self, coord: HexCoord, terrain: Terrain) {
        self.cells.insert(coord, MapCell::new(coord, terrain));
    }

    fn cell_mut_for_layout(&mut self, at: HexCoord, what: &str) -> Result<&mut MapCell> {
        self.cells
            .get_mut(&at)
            .ok_or_else(|| EngineError::InvalidScenario(format!("{} at {} is off the map", what, at)))
    }

    // === QUERIES ===

    pub fn cell(&self, coord: HexCoord) -> Option<&MapCell> {
        self.cells.get(&coord)
    }

    /// Lookup for coordinates the engine itself produced; a miss means
    /// internal state is corrupt
    pub fn require_cell(&self, coord: HexCoord) -> Result<&MapCell> {
        self.cells.get(&coord).ok_or(EngineError::HexNotFound(coord))
    }

    pub fn contains(&self, coord: HexCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All coordinates in ascending order
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.cells.keys().copied()
    }

    /// Entry cost for a domain including features and fortifications;
    /// `None` when off the map or impassable
    pub fn movement_cost(&self, coord: HexCoord, domain: MovementDomain) -> Option<u32> {
        let cell = self.cell(coord)?;
        let base = hex_entry_cost(cell.terrain, &cell.features, domain)?;
        let fort = if domain.is_ground() {
            self.fortification_at(coord).map_or(0, |f| f.movement_penalty)
        } else {
            0
        };
        Some(base + fort)
    }

    /// Whether a unit of this domain may stand on the hex at all
    pub fn is_passable(&self, coord: HexCoord, domain: MovementDomain) -> bool {
        self.movement_cost(coord, domain).is_some()
    }

    pub fn terrain_at(&self, coord: HexCoord) -> Option<Terrain> {
        self.cell(coord).map(|c| c.terrain)
    }

    /// Cover from terrain and features; 0 off the map
    pub fn terrain_cover(&self, coord: HexCoord) -> u32 {
        self.cell(coord).map_or(0, MapCell::cover)
    }

    pub fn fortification_at(&self, coord: HexCoord) -> Option<&Fortification> {
        self.fortifications.iter().find(|f| f.position == coord)
    }

    pub fn fortifications(&self) -> &[Fortification] {
        &self.fortifications
    }

    pub fn fortification_bonus(&self, coord: HexCoord) -> u32 {
        self.fortification_at(coord).map_or(0, |f| f.defense_bonus)
    }

    /// Terrain, fortification or smoke blocks sight through this hex
    pub fn blocks_los(&self, coord: HexCoord) -> bool {
        if self.smoke.contains(&coord) {
            return true;
        }
        if self.fortification_at(coord).is_some_and(|f| f.blocks_los) {
            return true;
        }
        self.cell(coord).is_some_and(|c| c.terrain.blocks_los())
    }

    pub fn is_water(&self, coord: HexCoord) -> bool {
        self.cell(coord).is_some_and(|c| c.terrain.is_water())
    }

    /// Line of sight considering the map alone (no unit blockers)
    pub fn has_line_of_sight(&self, from: HexCoord, to: HexCoord) -> bool {
        line_of_sight(from, to, |hex| self.blocks_los(hex))
    }

    /// All objectives with their positions, in coordinate order
    pub fn objectives(&self) -> impl Iterator<Item = (HexCoord, &ObjectiveMarker)> + '_ {
        self.cells
            .values()
            .filter_map(|c| c.objective.as_ref().map(|o| (c.coord, o)))
    }

    pub fn objective_at(&self, coord: HexCoord) -> Option<&ObjectiveMarker> {
        self.cell(coord).and_then(|c| c.objective.as_ref())
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<(HexCoord, &ObjectiveMarker)> {
        self.objectives().find(|(_, o)| o.id == id)
    }

    pub fn has_smoke(&self, coord: HexCoord) -> bool {
        self.smoke.contains(&coord)
    }

    pub fn smoke(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.smoke.iter().copied()
    }

    // === MUTATION ===

    pub fn set_terrain(&mut self, coord: HexCoord, terrain: Terrain) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.terrain = terrain;
        }
    }

    pub fn add_feature(&mut self, coord: HexCoord, feature: TerrainFeature) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            if !cell.features.contains(&feature) {
                cell.features.push(feature);
            }
        }
    }

    /// Place an objective; returns false if the hex is off the map
    pub fn add_objective(
        &mut self,
        coord: HexCoord,
        id: ObjectiveId,
        kind: ObjectiveKind,
        name: impl Into<String>,
    ) -> bool {
        match self.cells.get_mut(&coord) {
            Some(cell) => {
                cell.objective = Some(ObjectiveMarker {
                    id,
                    kind,
                    name: name.into(),
                    controller: None,
                });
                true
            }
            None => false,
        }
    }

    /// Add a fortification with its kind's default stats
    pub fn add_fortification(&mut self, kind: FortificationKind, position: HexCoord) -> FortificationId {
        let id = FortificationId(self.fortifications.len() as u32 + 1);
        let (defense_bonus, movement_penalty, blocks_los) = kind.default_stats();
        self.fortifications.push(Fortification {
            id,
            kind,
            position,
            defense_bonus,
            movement_penalty,
            blocks_los,
        });
        id
    }

    pub fn set_objective_controller(
        &mut self,
        id: ObjectiveId,
        controller: Option<PlayerId>,
    ) -> Result<()> {
        let marker = self
            .cells
            .values_mut()
            .filter_map(|c| c.objective.as_mut())
            .find(|o| o.id == id)
            .ok_or_else(|| EngineError::InvalidScenario(format!("{} is not on the map", id)))?;
        marker.controller = controller;
        Ok(())
    }

    pub fn place_smoke(&mut self, coord: HexCoord) {
        if self.contains(coord) {
            self.smoke.insert(coord);
        }
    }

    pub fn clear_smoke(&mut self) {
        self.smoke.clear();
    }
}

/// Outline of an authored map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapShape {
    Parallelogram { width: u32, height: u32 },
    Hexagon { radius: u32 },
}

/// Terrain override for one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLayout {
    pub at: HexCoord,
    #[serde(default)]
    pub terrain: Option<Terrain>,
    #[serde(default)]
    pub elevation: Option<i8>,
    #[serde(default)]
    pub features: Vec<TerrainFeature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveLayout {
    pub id: ObjectiveId,
    pub at: HexCoord,
    #[serde(default)]
    pub kind: ObjectiveKind,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortificationLayout {
    pub kind: FortificationKind,
    pub at: HexCoord,
    #[serde(default)]
    pub defense_bonus: Option<u32>,
    #[serde(default)]
    pub movement_penalty: Option<u32>,
    #[serde(default)]
    pub blocks_los: Option<bool>,
}

/// Externally authored map: shape, terrain, objectives and fortifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    pub shape: MapShape,
    #[serde(default)]
    pub default_terrain: Terrain,
    #[serde(default)]
    pub cells: Vec<CellLayout>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveLayout>,
    #[serde(default)]
    pub fortifications: Vec<FortificationLayout>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_map_creation() {
        let map = BattleMap::new(10, 8);
        assert_eq!(map.len(), 80);
        assert!(map.contains(HexCoord::new(9, 7)));
        assert!(!map.contains(HexCoord::new(10, 0)));
    }

    #[test]
    fn test_hexagon_map() {
        let map = BattleMap::hexagon(3);
        assert_eq!(map.len(), 37);
    }

    #[test]
    fn test_require_cell_is_hard_error() {
        let map = BattleMap::new(3, 3);
        assert!(map.require_cell(HexCoord::new(1, 1)).is_ok());
        assert!(matches!(
            map.require_cell(HexCoord::new(100, 100)),
            Err(EngineError::HexNotFound(_))
        ));
    }

    #[test]
    fn test_line_of_sight_blocked_by_forest() {
        let mut map = BattleMap::new(10, 10);
        let from = HexCoord::new(0, 0);
        let to = HexCoord::new(5, 0);
        assert!(map.has_line_of_sight(from, to));

        map.set_terrain(HexCoord::new(2, 0), Terrain::Forest);
        assert!(!map.has_line_of_sight(from, to));
    }

    #[test]
    fn test_smoke_blocks_until_cleared() {
        let mut map = BattleMap::new(10, 10);
        let from = HexCoord::new(0, 0);
        let to = HexCoord::new(4, 0);
        map.place_smoke(HexCoord::new(2, 0));
        assert!(!map.has_line_of_sight(from, to));
        map.clear_smoke();
        assert!(map.has_line_of_sight(from, to));
    }

    #[test]
    fn test_fortification_bonus_and_los() {
        let mut map = BattleMap::new(10, 10);
        map.add_fortification(FortificationKind::Bunker, HexCoord::new(3, 3));
        map.add_fortification(FortificationKind::Wire, HexCoord::new(4, 4));

        assert_eq!(map.fortification_bonus(HexCoord::new(3, 3)), 2);
        assert!(map.blocks_los(HexCoord::new(3, 3)));
        assert!(!map.blocks_los(HexCoord::new(4, 4)));
        assert_eq!(
            map.movement_cost(HexCoord::new(4, 4), MovementDomain::Foot),
            Some(3)
        );
        assert_eq!(
            map.movement_cost(HexCoord::new(4, 4), MovementDomain::Air),
            Some(1)
        );
    }

    #[test]
    fn test_movement_cost_off_map() {
        let map = BattleMap::new(2, 2);
        assert_eq!(map.movement_cost(HexCoord::new(-1, 0), MovementDomain::Air), None);
    }

    #[test]
    fn test_objective_controller_updates() {
        let mut map = BattleMap::new(5, 5);
        assert!(map.add_objective(HexCoord::new(2, 2), ObjectiveId(1), ObjectiveKind::Primary, "Airfield"));
        map.set_objective_controller(ObjectiveId(1), Some(PlayerId(1))).unwrap();
        assert_eq!(
            map.objective_at(HexCoord::new(2, 2)).and_then(|o| o.controller),
            Some(PlayerId(1))
        );
        assert!(map.set_objective_controller(ObjectiveId(9), None).is_err());
    }

    #[test]
    fn test_from_layout_json() {
        let json = r#"{
            "shape": {"kind": "parallelogram", "width": 6, "height": 4},
            "cells": [
                {"at": {"q": 0, "r": 0}, "terrain": "DeepWater"},
                {"at": {"q": 3, "r": 1}, "terrain": "Jungle", "features": ["Minefield"]}
            ],
            "objectives": [{"id": 1, "at": {"q": 5, "r": 2}, "name": "Radar"}],
            "fortifications": [{"kind": "Trench", "at": {"q": 4, "r": 2}}]
        }"#;
        let layout: MapLayout = serde_json::from_str(json).unwrap();
        let map = BattleMap::from_layout(&layout).unwrap();

        assert!(map.is_water(HexCoord::new(0, 0)));
        assert_eq!(map.terrain_at(HexCoord::new(3, 1)), Some(Terrain::Jungle));
        assert_eq!(map.objective(ObjectiveId(1)).map(|(h, _)| h), Some(HexCoord::new(5, 2)));
        assert_eq!(map.fortification_bonus(HexCoord::new(4, 2)), 1);
    }

    #[test]
    fn test_from_layout_rejects_off_map_entries() {
        let layout = MapLayout {
            shape: MapShape::Hexagon { radius: 2 },
            default_terrain: Terrain::Clear,
            cells: vec![CellLayout {
                at: HexCoord::new(9, 9),
                terrain: Some(Terrain::Forest),
                elevation: None,
                features: Vec::new(),
            }],
            objectives: Vec::new(),
            fortifications: Vec::new(),
        };
        assert!(matches!(
            BattleMap::from_layout(&layout),
            Err(EngineError::InvalidScenario(_))
        ));
    }
}
