//! Core type definitions used throughout the codebase

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a single game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for units
///
/// Assigned once at deployment and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Unique identifier for players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Identifier for map objectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectiveId(pub u32);

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "objective#{}", self.0)
    }
}

/// Identifier for fortifications placed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FortificationId(pub u32);

/// Turn counter (starts at 1)
pub type Turn = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_ordering() {
        assert!(UnitId(1) < UnitId(2));
        assert_eq!(UnitId(7), UnitId(7));
    }

    #[test]
    fn test_unit_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<UnitId, &str> = HashMap::new();
        map.insert(UnitId(1), "marines");
        assert_eq!(map.get(&UnitId(1)), Some(&"marines"));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&PlayerId(3)).unwrap();
        assert_eq!(json, "3");
        let back: UnitId = serde_json::from_str("12").unwrap();
        assert_eq!(back, UnitId(12));
    }

    #[test]
    fn test_game_ids_are_unique() {
        assert_ne!(GameId::new(), GameId::new());
    }
}
