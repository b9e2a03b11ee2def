use thiserror::Error;

use crate::battle::abilities::AbilityKind;
use crate::battle::actions::ActionType;
use crate::battle::execution::Phase;
use crate::battle::hex::HexCoord;
use crate::battle::terrain::Terrain;
use crate::core::types::{ObjectiveId, PlayerId, UnitId};

/// Hard failures: corrupted internal state or unreadable input files.
///
/// These are never produced by a player submitting an illegal action.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Hex not found on map: {0}")]
    HexNotFound(HexCoord),

    #[error("Invalid cube coordinate ({q}, {r}, {s}): q + r + s must be 0")]
    InvalidHex { q: i32, r: i32, s: i32 },

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Broad category of a rejected action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Wrong phase, wrong player, game over
    IllegalAction,
    /// Range, adjacency, cargo, terrain and similar checks
    PreconditionNotMet,
    /// Command points, ammo, launch capacity, ability uses
    ResourceExhausted,
}

/// Why an action was rejected. Producing one never mutates state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("game is already over")]
    GameOver,

    #[error("{action} is not allowed during the {phase} phase")]
    WrongPhase { action: ActionType, phase: Phase },

    #[error("it is not {0}'s turn")]
    NotActivePlayer(PlayerId),

    #[error("{0} is not part of this game")]
    UnknownPlayer(PlayerId),

    #[error("action is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("{0} does not exist")]
    UnknownUnit(UnitId),

    #[error("{unit} is not owned by {player}")]
    NotOwner { unit: UnitId, player: PlayerId },

    #[error("{0} has been destroyed")]
    UnitDestroyed(UnitId),

    #[error("{0} has already acted this turn")]
    AlreadyActed(UnitId),

    #[error("{0} has already moved this turn")]
    AlreadyMoved(UnitId),

    #[error("{0} is pinned")]
    UnitPinned(UnitId),

    #[error("{0} is embarked")]
    UnitEmbarked(UnitId),

    #[error("{0} cannot move")]
    CannotMove(UnitId),

    #[error("{0} has no attack capability")]
    NoAttack(UnitId),

    #[error("cannot attack a friendly unit")]
    FriendlyTarget,

    #[error("an ambush can only be sprung from concealment")]
    AmbushNotConcealed,

    #[error("target {0} is already destroyed")]
    TargetDestroyed(UnitId),

    #[error("cannot target hidden unit")]
    HiddenTarget,

    #[error("target is out of range (distance {distance})")]
    OutOfRange { distance: u32 },

    #[error("target category cannot be engaged by this unit")]
    InvalidTargetCategory,

    #[error("no line of sight to target")]
    NoLineOfSight,

    #[error("{0} is not on the map")]
    OffMap(HexCoord),

    #[error("{0} is occupied")]
    HexOccupied(HexCoord),

    #[error("terrain {terrain:?} cannot be entered by this unit")]
    TerrainRestricted { terrain: Terrain },

    #[error("no path to {0} within movement allowance")]
    NoPath(HexCoord),

    #[error("units must be within one hex")]
    NotAdjacent,

    #[error("{0} cannot carry cargo")]
    NotATransport(UnitId),

    #[error("{transport} cannot carry {passenger}")]
    CargoIncompatible { transport: UnitId, passenger: UnitId },

    #[error("transport is at capacity ({capacity})")]
    CargoFull { capacity: usize },

    #[error("{unit} is not carried by {transport}")]
    NotInCargo { unit: UnitId, transport: UnitId },

    #[error("the mobile base loads and unloads only through launch and recovery")]
    UseMobileBase,

    #[error("unit is not on an objective")]
    NotOnObjective,

    #[error("{0} is already held")]
    ObjectiveAlreadyHeld(ObjectiveId),

    #[error("{0} is contested by an adjacent enemy")]
    ObjectiveContested(ObjectiveId),

    #[error("{0} cannot secure objectives")]
    CannotSecure(UnitId),

    #[error("player has no mobile base")]
    NoMobileBase,

    #[error("{0} is not the mobile base")]
    NotMobileBase(UnitId),

    #[error("{0} is not hidden")]
    NotHidden(UnitId),

    #[error("{unit} does not have the {ability} ability")]
    AbilityUnavailable { unit: UnitId, ability: AbilityKind },

    #[error("ability requirement not met: {0}")]
    AbilityRequirement(&'static str),

    #[error("{0} cannot be launched from the mobile base")]
    NotLaunchable(UnitId),

    #[error("well deck cannot launch heavy landing craft and light amphibious vehicles in the same turn")]
    WellDeckModeConflict,

    #[error("no units were listed")]
    EmptyBatch,

    #[error("{0} is listed more than once")]
    DuplicateUnit(UnitId),

    #[error("no units could be recovered")]
    NothingRecovered,

    #[error("insufficient command points: need {needed}, have {available}")]
    InsufficientCommandPoints { needed: u32, available: u32 },

    #[error("no uses of {ability} remaining")]
    NoUsesRemaining { ability: AbilityKind },

    #[error("point-defense magazine is empty")]
    NoAmmo,

    #[error("point-defense magazine is already full")]
    MagazineFull,

    #[error("{deck} capacity exceeded: requested {requested}, available {available}")]
    LaunchCapacityExceeded {
        deck: &'static str,
        requested: u32,
        available: u32,
    },
}

/// Failure inside an action handler
///
/// Handlers validate fully (returning `Rejected`) before their first
/// mutation; only `Engine` may surface after that point.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Rejected(#[from] RuleViolation),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RuleViolation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            RuleViolation::GameOver
            | RuleViolation::WrongPhase { .. }
            | RuleViolation::NotActivePlayer(_)
            | RuleViolation::UnknownPlayer(_) => ViolationKind::IllegalAction,

            RuleViolation::InsufficientCommandPoints { .. }
            | RuleViolation::NoUsesRemaining { .. }
            | RuleViolation::NoAmmo
            | RuleViolation::LaunchCapacityExceeded { .. } => ViolationKind::ResourceExhausted,

            _ => ViolationKind::PreconditionNotMet,
        }
    }
}
