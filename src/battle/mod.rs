//! Battle system - hex-grid amphibious assault rules engine
//!
//! One assault force lands from a mobile base against a dug-in coastal
//! defense. All rules live here:
//! - Hex math, terrain and the battlefield map
//! - Units, players and the mobile base's shipboard systems
//! - Dice-pool combat with cover, flanking and suppression
//! - Per-player fog of war with concealment and decoys
//! - The phase machine and the single action entrypoint (`ActionEngine`)

pub mod abilities;
pub mod actions;
pub mod battle_map;
pub mod constants;
pub mod dice;
mod engagement;
pub mod engine;
pub mod execution;
mod handlers;
pub mod hex;
pub mod pathfinding;
pub mod player;
pub mod resolution;
pub mod scenario;
pub mod ship_ops;
pub mod snapshot;
pub mod terrain;
pub mod unit_type;
pub mod units;
pub mod victory;
pub mod visibility;

// Re-exports for convenient access
pub use abilities::{AbilityKind, AbilityState};
pub use actions::{Action, ActionData, ActionResult, ActionType};
pub use battle_map::{
    BattleMap, Fortification, FortificationKind, MapCell, MapLayout, MapShape, ObjectiveKind,
    ObjectiveMarker,
};
pub use constants::*;
pub use dice::{Dice, DiceRoller};
pub use engine::{ActionEngine, DecisionMaker, EngineObserver, EventRecorder, TracingObserver};
pub use execution::{EventType, GameEvent, GameState, GameSummary, Phase, PlayerSummary};
pub use hex::{line_of_sight, HexCoord, HexDirection};
pub use pathfinding::{find_path, path_cost};
pub use player::{Player, Side};
pub use resolution::{can_attack, resolve, AttackModifiers, AttackProfile, CombatResult};
pub use scenario::{Deployment, PlayerSetup, Scenario};
pub use ship_ops::{ShipOperations, ShipStatus, SystemStatus};
pub use snapshot::GameSnapshot;
pub use terrain::{MovementDomain, Terrain, TerrainFeature};
pub use unit_type::{Capability, UnitProfile, UnitStats, UnitType};
pub use units::{StatusFlag, Unit};
pub use victory::{GameOutcome, VictoryCondition};
pub use visibility::{LastKnown, VisibilitySystem};
