//! Victory conditions, checked in a configurable priority order
//!
//! Each condition is independent; the first satisfied one in the list
//! decides the game.

use serde::{Deserialize, Serialize};

use crate::battle::execution::GameState;
use crate::battle::player::{Player, Side};
use crate::core::types::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryCondition {
    /// Attacker holds every primary objective
    AllPrimaryObjectivesSecured,
    /// Defender has no living combat units
    DefenderEliminated,
    /// Attacker's mobile base is destroyed
    MobileBaseLost,
    /// Attacker's living combat units fell below the configured threshold
    AttackerAttrition,
    /// Last turn ended with primary objectives incomplete
    TurnLimitReached,
}

impl VictoryCondition {
    pub fn default_priority() -> Vec<VictoryCondition> {
        vec![
            VictoryCondition::AllPrimaryObjectivesSecured,
            VictoryCondition::DefenderEliminated,
            VictoryCondition::MobileBaseLost,
            VictoryCondition::AttackerAttrition,
            VictoryCondition::TurnLimitReached,
        ]
    }

    /// Side that wins when this condition is met
    pub fn winning_side(&self) -> Side {
        match self {
            VictoryCondition::AllPrimaryObjectivesSecured | VictoryCondition::DefenderEliminated => {
                Side::Assault
            }
            _ => Side::Defense,
        }
    }

    pub fn is_met(&self, state: &GameState) -> bool {
        let (Some(attacker), Some(defender)) = (
            state.player_by_side(Side::Assault),
            state.player_by_side(Side::Defense),
        ) else {
            return false;
        };

        match self {
            VictoryCondition::AllPrimaryObjectivesSecured => attacker.primary_objectives_complete(),
            VictoryCondition::DefenderEliminated => defender.active_unit_count() == 0,
            VictoryCondition::MobileBaseLost => mobile_base_lost(attacker),
            VictoryCondition::AttackerAttrition => {
                attacker.active_unit_count() < state.config.attacker_attrition_threshold
            }
            VictoryCondition::TurnLimitReached => {
                state.turn >= state.config.turn_limit && !attacker.primary_objectives_complete()
            }
        }
    }
}

fn mobile_base_lost(attacker: &Player) -> bool {
    attacker
        .ship
        .as_ref()
        .and_then(|ops| attacker.unit(ops.ship_id))
        .is_some_and(|ship| !ship.is_alive())
}

/// How the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: PlayerId,
    pub side: Side,
    pub condition: VictoryCondition,
}

/// First satisfied condition in `state.config.victory_priority`.
///
/// Mid-turn checks pass `end_of_turn = false`, which skips the turn limit.
pub fn evaluate(state: &GameState, end_of_turn: bool) -> Option<GameOutcome> {
    state
        .config
        .victory_priority
        .iter()
        .filter(|c| end_of_turn || **c != VictoryCondition::TurnLimitReached)
        .find(|c| c.is_met(state))
        .and_then(|condition| {
            let side = condition.winning_side();
            state.player_by_side(side).map(|winner| GameOutcome {
                winner: winner.id,
                side,
                condition: *condition,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::{BattleMap, ObjectiveKind};
    use crate::battle::dice::Dice;
    use crate::battle::hex::HexCoord;
    use crate::battle::unit_type::UnitType;
    use crate::battle::units::Unit;
    use crate::core::config::RulesConfig;
    use crate::core::types::{ObjectiveId, UnitId};

    const ASSAULT: PlayerId = PlayerId(1);
    const DEFENSE: PlayerId = PlayerId(2);

    fn state(assault: &[(u32, UnitType)], defense: &[(u32, UnitType)]) -> GameState {
        let mut map = BattleMap::new(8, 8);
        map.add_objective(HexCoord::new(4, 4), ObjectiveId(1), ObjectiveKind::Primary, "Airfield");
        let mut attacker = Player::new(ASSAULT, Side::Assault, "Task Force");
        for (i, (id, unit_type)) in assault.iter().enumerate() {
            attacker.add_unit(Unit::new(UnitId(*id), *unit_type, ASSAULT, HexCoord::new(i as i32, 0)));
        }
        let mut defender = Player::new(DEFENSE, Side::Defense, "Garrison");
        for (i, (id, unit_type)) in defense.iter().enumerate() {
            defender.add_unit(Unit::new(UnitId(*id), *unit_type, DEFENSE, HexCoord::new(i as i32, 7)));
        }
        GameState::new(map, vec![attacker, defender], RulesConfig::default(), Dice::seeded(1)).unwrap()
    }

    fn marines() -> Vec<(u32, UnitType)> {
        vec![(1, UnitType::MarineSquad), (2, UnitType::MarineSquad)]
    }

    #[test]
    fn test_no_condition_at_start() {
        let state = state(&marines(), &[(10, UnitType::InfantrySquad)]);
        assert_eq!(evaluate(&state, true), None);
    }

    #[test]
    fn test_decoys_do_not_keep_defender_alive() {
        let mut state = state(
            &marines(),
            &[(10, UnitType::InfantrySquad), (11, UnitType::DecoyMarker)],
        );
        state.unit_mut(UnitId(10)).unwrap().destroy();
        let outcome = evaluate(&state, false).unwrap();
        assert_eq!(outcome.condition, VictoryCondition::DefenderEliminated);
        assert_eq!(outcome.winner, ASSAULT);
    }

    #[test]
    fn test_attrition_below_threshold() {
        let mut state = state(&marines(), &[(10, UnitType::InfantrySquad)]);
        state.unit_mut(UnitId(2)).unwrap().destroy();
        let outcome = evaluate(&state, false).unwrap();
        assert_eq!(outcome.condition, VictoryCondition::AttackerAttrition);
        assert_eq!(outcome.side, Side::Defense);
    }

    #[test]
    fn test_turn_limit_only_at_end_of_turn() {
        let mut state = state(&marines(), &[(10, UnitType::InfantrySquad)]);
        state.turn = state.config.turn_limit;
        assert_eq!(evaluate(&state, false), None);
        let outcome = evaluate(&state, true).unwrap();
        assert_eq!(outcome.condition, VictoryCondition::TurnLimitReached);
        assert_eq!(outcome.winner, DEFENSE);
    }

    #[test]
    fn test_objectives_outrank_elimination() {
        let mut state = state(&marines(), &[(10, UnitType::InfantrySquad)]);
        state.unit_mut(UnitId(10)).unwrap().destroy();
        if let Some(player) = state.player_mut(ASSAULT) {
            player.record_objective(ObjectiveId(1), true, 1);
        }
        let outcome = evaluate(&state, false).unwrap();
        assert_eq!(outcome.condition, VictoryCondition::AllPrimaryObjectivesSecured);
    }

    #[test]
    fn test_priority_is_configurable() {
        let mut state = state(&marines(), &[(10, UnitType::InfantrySquad)]);
        state.unit_mut(UnitId(10)).unwrap().destroy();
        state.unit_mut(UnitId(2)).unwrap().destroy();
        assert_eq!(
            evaluate(&state, false).map(|o| o.condition),
            Some(VictoryCondition::DefenderEliminated)
        );
        state.config.victory_priority = vec![
            VictoryCondition::AttackerAttrition,
            VictoryCondition::DefenderEliminated,
        ];
        assert_eq!(
            evaluate(&state, false).map(|o| o.condition),
            Some(VictoryCondition::AttackerAttrition)
        );
    }

    #[test]
    fn test_winning_sides() {
        assert_eq!(VictoryCondition::DefenderEliminated.winning_side(), Side::Assault);
        assert_eq!(VictoryCondition::MobileBaseLost.winning_side(), Side::Defense);
        assert_eq!(VictoryCondition::TurnLimitReached.winning_side(), Side::Defense);
    }
}
