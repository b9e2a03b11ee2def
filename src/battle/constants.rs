//! Fixed rules of the game - values scenarios cannot change
//!
//! Tunable values live in `core::config::RulesConfig`.

// Vision (hexes)
pub const BASE_SIGHT_RANGE: u32 = 4;
pub const AIR_SIGHT_RANGE: u32 = 8;
pub const SHIP_SIGHT_RANGE: u32 = 10;
pub const SUPPRESSED_SIGHT_PENALTY: u32 = 1;
pub const MIN_SIGHT_RANGE: u32 = 1;

// Detection of hidden units (hexes)
pub const BASE_DETECTION_RANGE: u32 = 1;
pub const RECON_DETECTION_RANGE: u32 = 2;

// Combat modifiers - ADDITIVE dice and threshold steps
pub const FLANK_BONUS_DICE: u32 = 1;
pub const AMBUSH_BONUS_DICE: u32 = 1;
pub const ENTRENCHED_DEFENSE_BONUS: u32 = 1;
pub const MIN_HIT_THRESHOLD: u32 = 1;
pub const DIE_FACES: u8 = 6;

// Suppression tokens: 1 = suppressed, 2 = pinned
pub const MAX_SUPPRESSION: u8 = 2;
pub const SUPPRESSION_RECOVERY_PER_TURN: u8 = 1;

// Mobile base hull tiers, in percent of max hull (strictly greater than)
pub const HULL_OPERATIONAL_PCT: u32 = 75;
pub const HULL_DEGRADED_PCT: u32 = 50;
pub const HULL_LIMITED_PCT: u32 = 25;

// Per-turn launches by deck status
pub const LAUNCHES_OPERATIONAL: u32 = 2;
pub const LAUNCHES_REDUCED: u32 = 1;

// Command points generated by the mobile base's command-and-control
pub const C2_CP_OPERATIONAL: u32 = 3;
pub const C2_CP_DEGRADED: u32 = 2;

// Recovery reach from the mobile base (hexes)
pub const RECOVERY_RANGE: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sight_ordering() {
        assert!(BASE_SIGHT_RANGE < AIR_SIGHT_RANGE);
        assert!(AIR_SIGHT_RANGE < SHIP_SIGHT_RANGE);
        assert!(MIN_SIGHT_RANGE <= BASE_SIGHT_RANGE - SUPPRESSED_SIGHT_PENALTY);
    }

    #[test]
    fn test_hull_tiers_descend() {
        assert!(HULL_OPERATIONAL_PCT > HULL_DEGRADED_PCT);
        assert!(HULL_DEGRADED_PCT > HULL_LIMITED_PCT);
    }

    #[test]
    fn test_recon_detects_further() {
        assert!(RECON_DETECTION_RANGE > BASE_DETECTION_RANGE);
    }
}
