//! A* pathfinding over hex coordinates
//!
//! The grid itself knows nothing about terrain; callers supply the cost of
//! entering each hex. Entry costs are expected to be at least 1 so that hex
//! distance stays an admissible heuristic.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::battle::hex::HexCoord;

/// Node in the A* open set
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathNode {
    coord: HexCoord,
    f_cost: u32, // g_cost + heuristic
    g_cost: u32,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; coordinate breaks ties so search
        // order does not depend on heap internals
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path from `start` to `goal`
///
/// `cost_fn` returns the cost of entering a hex, or `None` when it cannot
/// be entered. `max_cost` bounds the accumulated entry cost of the path
/// (the start hex is free). Returns the path start..=goal, or an empty
/// vec when the goal is unreachable within budget.
pub fn find_path<F>(start: HexCoord, goal: HexCoord, cost_fn: F, max_cost: u32) -> Vec<HexCoord>
where
    F: Fn(HexCoord) -> Option<u32>,
{
    if start == goal {
        return vec![start];
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut g_scores: HashMap<HexCoord, u32> = HashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        f_cost: start.distance(&goal),
        g_cost: 0,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return reconstruct_path(&came_from, current.coord);
        }

        // Stale heap entry
        if g_scores
            .get(&current.coord)
            .is_some_and(|&best| current.g_cost > best)
        {
            continue;
        }

        for neighbor in current.coord.neighbors() {
            let Some(step) = cost_fn(neighbor) else {
                continue;
            };

            let tentative_g = current.g_cost.saturating_add(step);
            if tentative_g > max_cost {
                continue;
            }

            let improves = g_scores
                .get(&neighbor)
                .map_or(true, |&existing| tentative_g < existing);
            if improves {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    coord: neighbor,
                    f_cost: tentative_g + neighbor.distance(&goal),
                    g_cost: tentative_g,
                });
            }
        }
    }

    Vec::new()
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &HashMap<HexCoord, HexCoord>, mut current: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Total entry cost of a path; the first hex is where the walker already
/// stands and costs nothing. `None` if any later hex is impassable.
pub fn path_cost<F>(path: &[HexCoord], cost_fn: F) -> Option<u32>
where
    F: Fn(HexCoord) -> Option<u32>,
{
    path.iter()
        .skip(1)
        .try_fold(0u32, |total, hex| Some(total.saturating_add(cost_fn(*hex)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(_: HexCoord) -> Option<u32> {
        Some(1)
    }

    #[test]
    fn test_pathfind_straight_line() {
        let start = HexCoord::new(0, 0);
        let goal = HexCoord::new(5, 0);

        let path = find_path(start, goal, open, 10);

        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            assert_eq!(pair[0].distance(&pair[1]), 1);
        }
    }

    #[test]
    fn test_pathfind_around_obstacle() {
        let wall = [HexCoord::new(2, 0), HexCoord::new(2, -1), HexCoord::new(2, 1)];
        let cost = |h: HexCoord| if wall.contains(&h) { None } else { Some(1) };

        let path = find_path(HexCoord::new(0, 0), HexCoord::new(4, 0), cost, 20);

        assert!(!path.is_empty());
        assert!(path.iter().all(|h| !wall.contains(h)));
    }

    #[test]
    fn test_pathfind_respects_budget() {
        let start = HexCoord::new(0, 0);
        let goal = HexCoord::new(4, 0);

        assert!(find_path(start, goal, open, 3).is_empty());
        assert_eq!(find_path(start, goal, open, 4).len(), 5);
    }

    #[test]
    fn test_pathfind_no_path() {
        let goal = HexCoord::new(5, 5);
        let ring = goal.neighbors();
        let cost = |h: HexCoord| if ring.contains(&h) { None } else { Some(1) };

        let path = find_path(HexCoord::new(0, 0), goal, cost, 100);

        assert!(path.is_empty());
    }

    #[test]
    fn test_pathfind_same_start_goal() {
        let start = HexCoord::new(5, 5);
        let path = find_path(start, start, open, 0);
        assert_eq!(path, vec![start]);
    }

    #[test]
    fn test_pathfind_prefers_cheap_terrain() {
        // Direct line through (1,0) is expensive; the detour is cheaper
        let swamp = HexCoord::new(1, 0);
        let cost = |h: HexCoord| Some(if h == swamp { 5 } else { 1 });

        let path = find_path(HexCoord::new(0, 0), HexCoord::new(2, 0), cost, 10);

        assert!(!path.contains(&swamp));
        assert_eq!(path_cost(&path, cost), Some(3));
    }

    #[test]
    fn test_path_cost_skips_start() {
        let path = vec![HexCoord::new(0, 0), HexCoord::new(1, 0), HexCoord::new(2, 0)];
        let cost = |h: HexCoord| Some(if h == HexCoord::new(0, 0) { 99 } else { 2 });
        assert_eq!(path_cost(&path, cost), Some(4));
    }

    #[test]
    fn test_path_cost_impassable() {
        let path = vec![HexCoord::new(0, 0), HexCoord::new(1, 0)];
        assert_eq!(path_cost(&path, |_| None), None);
    }
}
