//! Inbound action records and outbound results

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::battle::abilities::AbilityKind;
use crate::battle::execution::Phase;
use crate::battle::hex::HexCoord;
use crate::core::error::RuleViolation;
use crate::core::types::{PlayerId, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Move,
    Attack,
    Load,
    Unload,
    SpecialAbility,
    SecureObjective,
    Reveal,
    LaunchFromBase,
    RecoverToBase,
    Resupply,
    Intercept,
    EndPhase,
}

impl ActionType {
    pub const ALL: [ActionType; 12] = [
        ActionType::Move,
        ActionType::Attack,
        ActionType::Load,
        ActionType::Unload,
        ActionType::SpecialAbility,
        ActionType::SecureObjective,
        ActionType::Reveal,
        ActionType::LaunchFromBase,
        ActionType::RecoverToBase,
        ActionType::Resupply,
        ActionType::Intercept,
        ActionType::EndPhase,
    ];

    /// Phase whitelist
    pub fn allowed_in(&self, phase: Phase) -> bool {
        use ActionType::*;
        match phase {
            Phase::Event | Phase::End => matches!(self, EndPhase),
            Phase::Command => matches!(self, SpecialAbility | Resupply | EndPhase),
            Phase::Deployment => {
                matches!(self, LaunchFromBase | RecoverToBase | Load | Unload | EndPhase)
            }
            Phase::Movement => matches!(self, Move | Load | Unload | RecoverToBase | EndPhase),
            Phase::Action => matches!(
                self,
                Attack | SpecialAbility | SecureObjective | Reveal | Intercept | EndPhase
            ),
        }
    }

    /// The action names a unit of the submitting player
    pub fn requires_actor(&self) -> bool {
        !matches!(self, ActionType::Resupply | ActionType::EndPhase)
    }

    /// The actor must be able to act (alive, unspent, not pinned, not embarked)
    pub fn requires_ready(&self) -> bool {
        matches!(
            self,
            ActionType::Move
                | ActionType::Attack
                | ActionType::Load
                | ActionType::SpecialAbility
                | ActionType::SecureObjective
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Optional payload carried by an action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionData {
    pub ability: Option<AbilityKind>,
    /// Batch members for launch and recovery
    pub unit_ids: Vec<UnitId>,
    /// Attacker declares an ambush from concealment
    pub ambush: bool,
}

/// A requested state change: the engine's only inbound command
///
/// Who does what depends on the type:
/// - `Load`: `unit_id` boards `target_id`
/// - `Unload`: transport `unit_id` puts `target_id` down at `target_position`
/// - `LaunchFromBase` / `RecoverToBase`: `unit_id` is the mobile base,
///   `data.unit_ids` the batch
/// - `Intercept`: the mobile base fires at `target_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub player_id: PlayerId,
    #[serde(default)]
    pub unit_id: Option<UnitId>,
    #[serde(default)]
    pub target_id: Option<UnitId>,
    #[serde(default)]
    pub target_position: Option<HexCoord>,
    #[serde(default)]
    pub data: ActionData,
}

impl Action {
    pub fn new(action_type: ActionType, player_id: PlayerId) -> Self {
        Self {
            action_type,
            player_id,
            unit_id: None,
            target_id: None,
            target_position: None,
            data: ActionData::default(),
        }
    }

    pub fn with_unit(mut self, unit: UnitId) -> Self {
        self.unit_id = Some(unit);
        self
    }

    pub fn with_target(mut self, target: UnitId) -> Self {
        self.target_id = Some(target);
        self
    }

    pub fn at(mut self, position: HexCoord) -> Self {
        self.target_position = Some(position);
        self
    }

    pub fn with_ability(mut self, ability: AbilityKind) -> Self {
        self.data.ability = Some(ability);
        self
    }

    pub fn with_batch(mut self, units: impl IntoIterator<Item = UnitId>) -> Self {
        self.data.unit_ids = units.into_iter().collect();
        self
    }

    pub fn with_ambush(mut self) -> Self {
        self.data.ambush = true;
        self
    }

    pub fn move_to(player: PlayerId, unit: UnitId, destination: HexCoord) -> Self {
        Self::new(ActionType::Move, player).with_unit(unit).at(destination)
    }

    pub fn attack(player: PlayerId, attacker: UnitId, target: UnitId) -> Self {
        Self::new(ActionType::Attack, player)
            .with_unit(attacker)
            .with_target(target)
    }

    pub fn end_phase(player: PlayerId) -> Self {
        Self::new(ActionType::EndPhase, player)
    }

    pub fn actor(&self) -> Result<UnitId, RuleViolation> {
        self.unit_id.ok_or(RuleViolation::MissingField("unitId"))
    }

    pub fn target(&self) -> Result<UnitId, RuleViolation> {
        self.target_id.ok_or(RuleViolation::MissingField("targetId"))
    }

    pub fn position(&self) -> Result<HexCoord, RuleViolation> {
        self.target_position
            .ok_or(RuleViolation::MissingField("targetPosition"))
    }
}

/// Outcome reported back to the submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn rejected(violation: &RuleViolation) -> Self {
        Self {
            success: false,
            message: violation.to_string(),
            data: None,
        }
    }
}
