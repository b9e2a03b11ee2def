//! Hex coordinate system for battle maps (cube coordinates)
//!
//! Cube coordinates (q, r, s) with q + r + s == 0. The invariant is held by
//! construction: `s` is always derived or checked, never set freely.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};

/// Offset applied when sampling a line so that a line running exactly
/// along a hex edge picks up the hexes on both sides of it.
const LINE_NUDGE: f64 = 1e-6;

/// Cube hex coordinate for the battle map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "CubeRepr")]
pub struct HexCoord {
    q: i32,
    r: i32,
    s: i32,
}

/// Wire form used to validate deserialized coordinates
#[derive(Deserialize)]
struct CubeRepr {
    q: i32,
    r: i32,
    s: Option<i32>,
}

impl TryFrom<CubeRepr> for HexCoord {
    type Error = EngineError;

    fn try_from(raw: CubeRepr) -> Result<Self> {
        match raw.s {
            Some(s) => HexCoord::from_cube(raw.q, raw.r, s),
            None => Ok(HexCoord::new(raw.q, raw.r)),
        }
    }
}

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { q: 0, r: 0, s: 0 };

    /// Build from axial (q, r); s is derived
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    /// Build from all three cube components, rejecting q + r + s != 0
    pub fn from_cube(q: i32, r: i32, s: i32) -> Result<Self> {
        if q + r + s != 0 {
            return Err(EngineError::InvalidHex { q, r, s });
        }
        Ok(Self { q, r, s })
    }

    pub fn q(&self) -> i32 {
        self.q
    }

    pub fn r(&self) -> i32 {
        self.r
    }

    pub fn s(&self) -> i32 {
        self.s
    }

    /// Stable string key ("q,r,s") for external collaborators
    pub fn key(&self) -> String {
        format!("{},{},{}", self.q, self.r, self.s)
    }

    /// Hex distance: the largest absolute component difference
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s - other.s).unsigned_abs();
        dq.max(dr).max(ds)
    }

    /// The adjacent hex in a direction
    pub fn neighbor(&self, direction: HexDirection) -> Self {
        *self + direction.offset()
    }

    /// All 6 neighboring hexes, in `HexDirection::ALL` order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        HexDirection::ALL.map(|d| self.neighbor(d))
    }

    /// Every hex within `radius` of self, self included
    ///
    /// Yields 3n² + 3n + 1 coordinates.
    pub fn range(&self, radius: u32) -> Vec<HexCoord> {
        let n = radius as i32;
        let mut results = Vec::with_capacity((3 * n * n + 3 * n + 1) as usize);
        for dq in -n..=n {
            for dr in (-n).max(-dq - n)..=n.min(-dq + n) {
                results.push(HexCoord::new(self.q + dq, self.r + dr));
            }
        }
        results
    }

    /// Hexes crossed by the straight line between the two hex centers,
    /// endpoints included
    ///
    /// Where the line runs along a boundary both candidate hexes are
    /// returned, so a blocker on either side is seen.
    pub fn line_to(&self, other: &Self) -> Vec<HexCoord> {
        let n = self.distance(other);
        if n == 0 {
            return vec![*self];
        }

        let mut results: Vec<HexCoord> = Vec::with_capacity(2 * n as usize + 1);
        for i in 0..=n {
            let t = i as f64 / n as f64;
            for nudge in [LINE_NUDGE, -LINE_NUDGE] {
                let q = lerp(self.q as f64 + nudge, other.q as f64 + nudge, t);
                let r = lerp(self.r as f64 + nudge, other.r as f64 + nudge, t);
                let s = lerp(
                    self.s as f64 - 2.0 * nudge,
                    other.s as f64 - 2.0 * nudge,
                    t,
                );
                let hex = Self::round(q, r, s);
                if !results.contains(&hex) {
                    results.push(hex);
                }
            }
        }
        results
    }

    /// Round a fractional cube position to the containing hex
    fn round(q: f64, r: f64, s: f64) -> Self {
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.q, self.r, self.s)
    }
}

impl Add for HexCoord {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Sub for HexCoord {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.q - rhs.q, self.r - rhs.r)
    }
}

/// Returns false if any hex strictly between `from` and `to` is blocked
pub fn line_of_sight<F>(from: HexCoord, to: HexCoord, blocked: F) -> bool
where
    F: Fn(HexCoord) -> bool,
{
    from.line_to(&to)
        .into_iter()
        .filter(|hex| *hex != from && *hex != to)
        .all(|hex| !blocked(hex))
}

/// The six hex directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// All directions, in neighbor scan order
    pub const ALL: [HexDirection; 6] = [
        HexDirection::East,
        HexDirection::NorthEast,
        HexDirection::NorthWest,
        HexDirection::West,
        HexDirection::SouthWest,
        HexDirection::SouthEast,
    ];

    /// Get the hex offset for this direction
    pub fn offset(&self) -> HexCoord {
        match self {
            HexDirection::East => HexCoord::new(1, 0),
            HexDirection::NorthEast => HexCoord::new(1, -1),
            HexDirection::NorthWest => HexCoord::new(0, -1),
            HexDirection::West => HexCoord::new(-1, 0),
            HexDirection::SouthWest => HexCoord::new(-1, 1),
            HexDirection::SouthEast => HexCoord::new(0, 1),
        }
    }

    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            HexDirection::East => HexDirection::West,
            HexDirection::NorthEast => HexDirection::SouthWest,
            HexDirection::NorthWest => HexDirection::SouthEast,
            HexDirection::West => HexDirection::East,
            HexDirection::SouthWest => HexDirection::NorthEast,
            HexDirection::SouthEast => HexDirection::NorthWest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_coord_creation() {
        let coord = HexCoord::new(5, -2);
        assert_eq!(coord.q(), 5);
        assert_eq!(coord.r(), -2);
        assert_eq!(coord.s(), -3);
    }

    #[test]
    fn test_from_cube_rejects_bad_sum() {
        assert!(HexCoord::from_cube(1, 1, -2).is_ok());
        assert!(matches!(
            HexCoord::from_cube(1, 1, 1),
            Err(EngineError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates_invariant() {
        let ok: HexCoord = serde_json::from_str(r#"{"q":2,"r":-1,"s":-1}"#).unwrap();
        assert_eq!(ok, HexCoord::new(2, -1));
        let axial: HexCoord = serde_json::from_str(r#"{"q":2,"r":-1}"#).unwrap();
        assert_eq!(axial, ok);
        assert!(serde_json::from_str::<HexCoord>(r#"{"q":2,"r":2,"s":2}"#).is_err());
    }

    #[test]
    fn test_hex_distance_same() {
        let a = HexCoord::new(3, 4);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_hex_distance_is_max_component() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(3, -1);
        assert_eq!(a.distance(&b), 3);
        assert_eq!(b.distance(&a), 3);
    }

    #[test]
    fn test_hex_neighbors_are_adjacent() {
        let coord = HexCoord::new(5, 5);
        let neighbors = coord.neighbors();
        assert_eq!(neighbors.len(), 6);
        for n in neighbors {
            assert_eq!(coord.distance(&n), 1);
        }
    }

    #[test]
    fn test_range_counts() {
        let center = HexCoord::new(2, -7);
        assert_eq!(center.range(0).len(), 1);
        assert_eq!(center.range(1).len(), 7);
        assert_eq!(center.range(2).len(), 19);
        assert_eq!(center.range(3).len(), 37);
        assert!(center.range(3).iter().all(|h| center.distance(h) <= 3));
    }

    #[test]
    fn test_hex_line_straight() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(3, 0);
        let line = a.line_to(&b);
        assert_eq!(line.len(), 4);
        assert_eq!(line.first(), Some(&a));
        assert_eq!(line.last(), Some(&b));
    }

    #[test]
    fn test_hex_line_boundary_samples_both_sides() {
        // (0,0) -> (1,1) runs along the edge between (1,0) and (0,1)
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, 1);
        let line = a.line_to(&b);
        assert!(line.contains(&HexCoord::new(1, 0)));
        assert!(line.contains(&HexCoord::new(0, 1)));
    }

    #[test]
    fn test_line_of_sight_ignores_endpoints() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(2, 0);
        assert!(line_of_sight(a, b, |h| h == a || h == b));
        assert!(!line_of_sight(a, b, |h| h == HexCoord::new(1, 0)));
    }

    #[test]
    fn test_line_of_sight_blocked_on_either_boundary_side() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, 1);
        assert!(!line_of_sight(a, b, |h| h == HexCoord::new(0, 1)));
        assert!(!line_of_sight(a, b, |h| h == HexCoord::new(1, 0)));
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(HexDirection::East.opposite(), HexDirection::West);
        assert_eq!(HexDirection::NorthEast.opposite(), HexDirection::SouthWest);
        for d in HexDirection::ALL {
            let there = HexCoord::ORIGIN.neighbor(d);
            assert_eq!(there.neighbor(d.opposite()), HexCoord::ORIGIN);
        }
    }

    #[test]
    fn test_key_format() {
        assert_eq!(HexCoord::new(1, -3).key(), "1,-3,2");
    }
}
