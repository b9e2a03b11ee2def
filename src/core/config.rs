//! Rules configuration with documented values
//!
//! Everything a scenario may legitimately tune lives here. Fixed rules of
//! the game (sight ranges, dice faces, tier thresholds) live in
//! `battle::constants` instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::player::Side;
use crate::battle::victory::VictoryCondition;
use crate::core::error::{EngineError, Result};

/// Tunable rules for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    // === TURN STRUCTURE ===
    /// Last playable turn. When it ends with the attacker's primary
    /// objectives incomplete, the defender wins.
    pub turn_limit: u32,

    /// Side that becomes active at the start of every phase
    pub initiative: Side,

    // === COMMAND POINTS ===
    /// Command points the defender receives on entering the Command phase
    pub defender_command_points: u32,

    /// Flat command points the attacker receives on top of the mobile
    /// base's command-and-control output
    pub attacker_base_command_points: u32,

    // === VICTORY ===
    /// The attacker loses once its count of living combat units drops
    /// below this value
    pub attacker_attrition_threshold: u32,

    /// Order in which victory conditions are checked; the first satisfied
    /// condition ends the game
    pub victory_priority: Vec<VictoryCondition>,

    // === MOBILE BASE AMMUNITION ===
    /// Point-defense/intercept rounds aboard at deployment
    pub starting_ammo: u32,

    /// Magazine size
    pub max_ammo: u32,

    /// Rounds restored by one resupply action
    pub resupply_amount: u32,

    /// Command points spent by one resupply action
    pub resupply_cost: u32,

    /// Fire point defense automatically whenever the mobile base is hit
    pub auto_point_defense: bool,

    /// Dice rolled by a point-defense salvo
    pub point_defense_dice: u32,

    /// Minimum die face that negates one incoming hit
    pub point_defense_threshold: u8,

    /// Dice rolled by a guided intercept
    pub intercept_dice: u32,

    /// Minimum die face for an intercept hit
    pub intercept_threshold: u8,

    /// Maximum distance from the mobile base to an intercept target
    pub intercept_range: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            turn_limit: 12,
            initiative: Side::Assault,

            defender_command_points: 2,
            attacker_base_command_points: 0,

            attacker_attrition_threshold: 2,
            victory_priority: VictoryCondition::default_priority(),

            starting_ammo: 6,
            max_ammo: 6,
            resupply_amount: 2,
            resupply_cost: 1,
            auto_point_defense: true,
            point_defense_dice: 3,
            point_defense_threshold: 5,
            intercept_dice: 2,
            intercept_threshold: 4,
            intercept_range: 5,
        }
    }
}

impl RulesConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RulesConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.turn_limit == 0 {
            return Err(EngineError::InvalidConfig("turn_limit must be at least 1".into()));
        }

        if self.starting_ammo > self.max_ammo {
            return Err(EngineError::InvalidConfig(format!(
                "starting_ammo ({}) exceeds max_ammo ({})",
                self.starting_ammo, self.max_ammo
            )));
        }

        for (name, threshold) in [
            ("point_defense_threshold", self.point_defense_threshold),
            ("intercept_threshold", self.intercept_threshold),
        ] {
            if !(1..=6).contains(&threshold) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} ({}) must be a die face between 1 and 6",
                    name, threshold
                )));
            }
        }

        if self.victory_priority.is_empty() {
            return Err(EngineError::InvalidConfig(
                "victory_priority must list at least one condition".into(),
            ));
        }

        let mut seen = Vec::with_capacity(self.victory_priority.len());
        for condition in &self.victory_priority {
            if seen.contains(condition) {
                return Err(EngineError::InvalidConfig(format!(
                    "victory condition {:?} listed twice",
                    condition
                )));
            }
            seen.push(*condition);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RulesConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RulesConfig::from_toml_str("turn_limit = 8\nstarting_ammo = 4\n").unwrap();
        assert_eq!(config.turn_limit, 8);
        assert_eq!(config.starting_ammo, 4);
        assert_eq!(config.max_ammo, RulesConfig::default().max_ammo);
        assert_eq!(config.initiative, Side::Assault);
    }

    #[test]
    fn test_victory_priority_from_toml() {
        let config = RulesConfig::from_toml_str(
            "victory_priority = [\"mobile_base_lost\", \"defender_eliminated\"]\n",
        )
        .unwrap();
        assert_eq!(
            config.victory_priority,
            vec![
                VictoryCondition::MobileBaseLost,
                VictoryCondition::DefenderEliminated
            ]
        );
    }

    #[test]
    fn test_rejects_ammo_above_magazine() {
        let mut config = RulesConfig::default();
        config.starting_ammo = config.max_ammo + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_victory_conditions() {
        let mut config = RulesConfig::default();
        config.victory_priority = vec![
            VictoryCondition::TurnLimitReached,
            VictoryCondition::TurnLimitReached,
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let result = RulesConfig::from_toml_str("intercept_threshold = 9\n");
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }
}
