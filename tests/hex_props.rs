//! Property tests for cube-coordinate hex math

use littoral_assault::battle::{line_of_sight, HexCoord};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = HexCoord> {
    (-40i32..40, -40i32..40).prop_map(|(q, r)| HexCoord::new(q, r))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_cube_coordinates_sum_to_zero(h in coord()) {
        prop_assert_eq!(h.q() + h.r() + h.s(), 0);
    }

    #[test]
    fn prop_distance_is_a_metric(a in coord(), b in coord(), c in coord()) {
        prop_assert_eq!(a.distance(&a), 0);
        prop_assert_eq!(a.distance(&b), b.distance(&a));
        prop_assert!(a.distance(&c) <= a.distance(&b) + b.distance(&c));
        if a != b {
            prop_assert!(a.distance(&b) > 0);
        }
    }

    #[test]
    fn prop_neighbors_are_adjacent(h in coord()) {
        let neighbors = h.neighbors();
        for n in neighbors {
            prop_assert_eq!(h.distance(&n), 1);
        }
        for (i, a) in neighbors.iter().enumerate() {
            for b in &neighbors[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn prop_line_connects_endpoints(a in coord(), b in coord()) {
        let line = a.line_to(&b);
        prop_assert_eq!(line.first(), Some(&a));
        prop_assert_eq!(line.last(), Some(&b));
        prop_assert!(line.len() as u32 >= a.distance(&b) + 1);
    }

    #[test]
    fn prop_range_size(h in coord(), radius in 0u32..6) {
        let hexes = h.range(radius);
        let n = radius as usize;
        prop_assert_eq!(hexes.len(), 3 * n * n + 3 * n + 1);
        prop_assert!(hexes.iter().all(|x| h.distance(x) <= radius));
        prop_assert!(hexes.contains(&h));
    }

    #[test]
    fn prop_endpoints_never_block_sight(a in coord(), b in coord()) {
        let blocked = |x: HexCoord| x == a || x == b;
        prop_assert!(line_of_sight(a, b, blocked));
    }

    #[test]
    fn prop_open_ground_has_sight(a in coord(), b in coord()) {
        prop_assert!(line_of_sight(a, b, |_| false));
    }
}
