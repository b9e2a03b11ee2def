//! Players and their exclusively owned units

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::battle_map::ObjectiveKind;
use crate::battle::ship_ops::ShipOperations;
use crate::battle::units::Unit;
use crate::core::error::RuleViolation;
use crate::core::types::{ObjectiveId, PlayerId, Turn, UnitId};

/// Which force a player commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Amphibious assault force, owner of the mobile base
    Assault,
    /// Static coastal defense
    Defense,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Assault => Side::Defense,
            Side::Defense => Side::Assault,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Assault => write!(f, "assault"),
            Side::Defense => write!(f, "defense"),
        }
    }
}

/// A player's standing on one objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub objective: ObjectiveId,
    pub kind: ObjectiveKind,
    pub secured: bool,
    /// Turn the objective was last secured by this player
    pub secured_on: Option<Turn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub side: Side,
    pub name: String,
    pub command_points: u32,
    pub units: BTreeMap<UnitId, Unit>,
    pub objectives: BTreeMap<ObjectiveId, ObjectiveProgress>,
    /// Present only for the side that owns the mobile base
    pub ship: Option<ShipOperations>,
}

impl Player {
    pub fn new(id: PlayerId, side: Side, name: impl Into<String>) -> Self {
        Self {
            id,
            side,
            name: name.into(),
            command_points: 0,
            units: BTreeMap::new(),
            objectives: BTreeMap::new(),
            ship: None,
        }
    }

    /// Take ownership of a unit; owner and side follow this player
    pub fn add_unit(&mut self, mut unit: Unit) {
        unit.owner = self.id;
        unit.side = self.side;
        self.units.insert(unit.id, unit);
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.values().filter(|u| u.is_alive())
    }

    /// Living units that count toward victory (decoys excluded)
    pub fn active_unit_count(&self) -> u32 {
        self.living_units()
            .filter(|u| u.profile().is_combatant())
            .count() as u32
    }

    pub fn spend_command_points(&mut self, amount: u32) -> Result<(), RuleViolation> {
        self.check_command_points(amount)?;
        self.command_points -= amount;
        Ok(())
    }

    pub fn check_command_points(&self, amount: u32) -> Result<(), RuleViolation> {
        if self.command_points < amount {
            return Err(RuleViolation::InsufficientCommandPoints {
                needed: amount,
                available: self.command_points,
            });
        }
        Ok(())
    }

    pub fn track_objective(&mut self, objective: ObjectiveId, kind: ObjectiveKind) {
        self.objectives.entry(objective).or_insert(ObjectiveProgress {
            objective,
            kind,
            secured: false,
            secured_on: None,
        });
    }

    pub fn record_objective(&mut self, objective: ObjectiveId, secured: bool, turn: Turn) {
        if let Some(progress) = self.objectives.get_mut(&objective) {
            progress.secured = secured;
            if secured {
                progress.secured_on = Some(turn);
            }
        }
    }

    /// True when at least one primary objective exists and all are held
    pub fn primary_objectives_complete(&self) -> bool {
        let mut primaries = self
            .objectives
            .values()
            .filter(|p| p.kind == ObjectiveKind::Primary)
            .peekable();
        primaries.peek().is_some() && primaries.all(|p| p.secured)
    }

    pub fn objectives_secured(&self) -> u32 {
        self.objectives.values().filter(|p| p.secured).count() as u32
    }
}
