//! Action engine: the single mutation entrypoint
//!
//! `execute` gates an action through `GameState::can_perform`, dispatches
//! it to its handler and forwards every event the handler appended to the
//! observer. Rule violations come back as unsuccessful `ActionResult`s;
//! only corrupted state surfaces as `EngineError`.

use tracing::{debug, info, trace};

use crate::battle::abilities;
use crate::battle::actions::{Action, ActionResult, ActionType};
use crate::battle::engagement;
use crate::battle::execution::{GameEvent, GameState, Phase};
use crate::battle::handlers;
use crate::core::error::{ActionError, Result, RuleViolation};

/// Receives every event the engine appends, in order
pub trait EngineObserver {
    fn on_event(&mut self, event: &GameEvent);

    fn on_rejected(&mut self, _action: &Action, _violation: &RuleViolation) {}
}

/// Default observer: events go to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn on_event(&mut self, event: &GameEvent) {
        info!(
            turn = event.turn,
            phase = %event.phase,
            seq = event.timestamp,
            kind = ?event.event_type,
            "{}",
            event.description
        );
    }

    fn on_rejected(&mut self, action: &Action, violation: &RuleViolation) {
        debug!(action = %action.action_type, player = %action.player_id, "rejected: {}", violation);
    }
}

/// Keeps a copy of every event; handy for replays and tests
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    pub events: Vec<GameEvent>,
    pub rejections: Vec<RuleViolation>,
}

impl EngineObserver for EventRecorder {
    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }

    fn on_rejected(&mut self, _action: &Action, violation: &RuleViolation) {
        self.rejections.push(violation.clone());
    }
}

/// External opponent logic. Works from a read-only view and gets no
/// privileges: its actions go through the same gate as anyone else's.
pub trait DecisionMaker {
    fn update(&mut self, state: &GameState) -> Vec<Action>;
}

impl GameState {
    /// Generic legality of an action, before any handler runs
    ///
    /// Gates in order: game over, phase whitelist, known player, active
    /// player, actor ownership, actor readiness. Pure.
    pub fn can_perform(&self, action: &Action) -> std::result::Result<(), RuleViolation> {
        if self.game_over {
            return Err(RuleViolation::GameOver);
        }
        if !action.action_type.allowed_in(self.phase) {
            return Err(RuleViolation::WrongPhase {
                action: action.action_type,
                phase: self.phase,
            });
        }
        if !self.players.contains_key(&action.player_id) {
            return Err(RuleViolation::UnknownPlayer(action.player_id));
        }
        if action.player_id != self.active_player {
            return Err(RuleViolation::NotActivePlayer(action.player_id));
        }
        if action.action_type.requires_actor() {
            let unit = self.owned_unit(action.player_id, action.actor()?)?;
            if action.action_type.requires_ready() {
                unit.check_ready()?;
            }
        }
        Ok(())
    }
}

fn dispatch(state: &mut GameState, action: &Action) -> std::result::Result<ActionResult, ActionError> {
    match action.action_type {
        ActionType::Move => handlers::move_unit(state, action),
        ActionType::Attack => engagement::attack(state, action),
        ActionType::Load => handlers::load(state, action),
        ActionType::Unload => handlers::unload(state, action),
        ActionType::SpecialAbility => abilities::use_ability(state, action),
        ActionType::SecureObjective => handlers::secure_objective(state, action),
        ActionType::Reveal => handlers::reveal(state, action),
        ActionType::LaunchFromBase => handlers::launch(state, action),
        ActionType::RecoverToBase => handlers::recover(state, action),
        ActionType::Resupply => handlers::resupply(state, action),
        ActionType::Intercept => engagement::intercept(state, action),
        ActionType::EndPhase => handlers::end_phase(state, action),
    }
}

pub struct ActionEngine<O: EngineObserver = TracingObserver> {
    observer: O,
}

impl ActionEngine<TracingObserver> {
    pub fn new() -> Self {
        Self {
            observer: TracingObserver,
        }
    }
}

impl Default for ActionEngine<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: EngineObserver> ActionEngine<O> {
    pub fn with_observer(observer: O) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Validate and apply one action
    pub fn execute(&mut self, state: &mut GameState, action: &Action) -> Result<ActionResult> {
        let before = state.events().len();
        let outcome = state
            .can_perform(action)
            .map_err(ActionError::from)
            .and_then(|()| dispatch(state, action));

        let result = match outcome {
            Ok(result) => {
                trace!(action = %action.action_type, "{}", result.message);
                result
            }
            Err(ActionError::Rejected(violation)) => {
                self.observer.on_rejected(action, &violation);
                ActionResult::rejected(&violation)
            }
            Err(ActionError::Engine(err)) => return Err(err),
        };

        self.forward(state, before);
        Ok(result)
    }

    /// Apply a batch in order; a rejected action does not stop the rest
    pub fn execute_all(&mut self, state: &mut GameState, actions: &[Action]) -> Result<Vec<ActionResult>> {
        actions.iter().map(|a| self.execute(state, a)).collect()
    }

    /// Force the next phase regardless of who has passed
    pub fn advance_phase(&mut self, state: &mut GameState) -> Phase {
        let before = state.events().len();
        let phase = state.advance_phase();
        self.forward(state, before);
        phase
    }

    /// Ask the decision maker for actions and submit them like any other
    pub fn run_decision_maker<D: DecisionMaker + ?Sized>(
        &mut self,
        state: &mut GameState,
        decision_maker: &mut D,
    ) -> Result<Vec<ActionResult>> {
        let actions = decision_maker.update(state);
        debug!(count = actions.len(), "decision maker submitted actions");
        self.execute_all(state, &actions)
    }

    fn forward(&mut self, state: &GameState, from: usize) {
        for event in state.events().get(from..).unwrap_or_default() {
            self.observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::dice::Dice;
    use crate::battle::execution::EventType;
    use crate::battle::hex::HexCoord;
    use crate::battle::player::{Player, Side};
    use crate::battle::unit_type::UnitType;
    use crate::battle::units::Unit;
    use crate::core::config::RulesConfig;
    use crate::core::types::{PlayerId, UnitId};

    const ASSAULT: PlayerId = PlayerId(1);
    const DEFENSE: PlayerId = PlayerId(2);

    fn state() -> GameState {
        let map = BattleMap::new(10, 10);
        let mut attacker = Player::new(ASSAULT, Side::Assault, "Task Force");
        attacker.add_unit(Unit::new(UnitId(1), UnitType::MarineSquad, ASSAULT, HexCoord::new(2, 2)));
        let mut defender = Player::new(DEFENSE, Side::Defense, "Garrison");
        defender.add_unit(Unit::new(UnitId(10), UnitType::InfantrySquad, DEFENSE, HexCoord::new(7, 7)));
        GameState::new(map, vec![attacker, defender], RulesConfig::default(), Dice::seeded(7)).unwrap()
    }

    fn to_phase(state: &mut GameState, phase: Phase) {
        while state.phase != phase {
            state.advance_phase();
        }
    }

    #[test]
    fn test_wrong_phase_rejected() {
        let mut state = state();
        let mut engine = ActionEngine::with_observer(EventRecorder::default());
        let action = Action::move_to(ASSAULT, UnitId(1), HexCoord::new(3, 2));
        let result = engine.execute(&mut state, &action).unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Move is not allowed during the Event phase");
        assert_eq!(state.unit(UnitId(1)).unwrap().position, HexCoord::new(2, 2));
        assert_eq!(engine.observer().rejections.len(), 1);
    }

    #[test]
    fn test_inactive_player_rejected() {
        let mut state = state();
        to_phase(&mut state, Phase::Movement);
        let action = Action::move_to(DEFENSE, UnitId(10), HexCoord::new(6, 7));
        assert_eq!(
            state.can_perform(&action),
            Err(RuleViolation::NotActivePlayer(DEFENSE))
        );
    }

    #[test]
    fn test_foreign_unit_rejected() {
        let mut state = state();
        to_phase(&mut state, Phase::Movement);
        let action = Action::move_to(ASSAULT, UnitId(10), HexCoord::new(6, 7));
        assert_eq!(
            state.can_perform(&action),
            Err(RuleViolation::NotOwner {
                unit: UnitId(10),
                player: ASSAULT
            })
        );
    }

    #[test]
    fn test_can_perform_is_idempotent() {
        let mut state = state();
        to_phase(&mut state, Phase::Movement);
        let actions = [
            Action::move_to(ASSAULT, UnitId(1), HexCoord::new(3, 2)),
            Action::attack(ASSAULT, UnitId(1), UnitId(10)),
            Action::end_phase(DEFENSE),
        ];
        for action in &actions {
            let first = state.can_perform(action);
            assert_eq!(first, state.can_perform(action));
            assert_eq!(first, state.can_perform(action));
        }
    }

    #[test]
    fn test_observer_sees_appended_events() {
        let mut state = state();
        let mut engine = ActionEngine::with_observer(EventRecorder::default());
        engine.execute(&mut state, &Action::end_phase(ASSAULT)).unwrap();
        engine.execute(&mut state, &Action::end_phase(DEFENSE)).unwrap();
        let kinds: Vec<EventType> = engine.observer().events.iter().map(|e| e.event_type).collect();
        assert_eq!(kinds.first(), Some(&EventType::ControlPassed));
        assert!(kinds.contains(&EventType::PhaseChanged));
        assert_eq!(state.phase, Phase::Command);
    }

    #[test]
    fn test_game_over_blocks_everything() {
        let mut state = state();
        state.game_over = true;
        assert_eq!(
            state.can_perform(&Action::end_phase(ASSAULT)),
            Err(RuleViolation::GameOver)
        );
    }

    struct Passer(PlayerId);

    impl DecisionMaker for Passer {
        fn update(&mut self, _state: &GameState) -> Vec<Action> {
            vec![Action::end_phase(self.0)]
        }
    }

    #[test]
    fn test_decision_maker_actions_are_gated() {
        let mut state = state();
        let mut engine = ActionEngine::new();
        let results = engine.run_decision_maker(&mut state, &mut Passer(DEFENSE)).unwrap();
        assert!(!results[0].success);
        let results = engine.run_decision_maker(&mut state, &mut Passer(ASSAULT)).unwrap();
        assert!(results[0].success);
        assert_eq!(state.active_player, DEFENSE);
    }
}
