//! Neighbor discovery for the communicate phase.
//!
//! Two agents are neighbors when both axis distances are strictly below the
//! communication range: a square box around each agent, not a circle.

use swarm_types::Position;

/// Whether agents at `a` and `b` can exchange knowledge.
pub const fn can_communicate(a: Position, b: Position, range: u32) -> bool {
    a.x.abs_diff(b.x) < range && a.y.abs_diff(b.y) < range
}

/// All unordered pairs `(i, j)` with `i < j` of indices into `positions`
/// that can communicate, in lexicographic order.
pub fn neighbor_pairs(positions: &[Position], range: u32) -> Vec<(usize, usize)> {
    positions
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| {
            positions
                .iter()
                .enumerate()
                .skip(i.saturating_add(1))
                .filter(move |&(_, &b)| can_communicate(a, b, range))
                .map(move |(j, _)| (i, j))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_a_strict_box() {
        let origin = Position::new(0, 0);
        assert!(can_communicate(origin, Position::new(3, 3), 4));
        assert!(!can_communicate(origin, Position::new(4, 0), 4));
        assert!(!can_communicate(origin, Position::new(0, 4), 4));
        assert!(can_communicate(origin, origin, 1));
        assert!(!can_communicate(origin, origin, 0));
    }

    #[test]
    fn relation_is_symmetric() {
        let a = Position::new(2, 7);
        let b = Position::new(5, 5);
        for range in 0..6 {
            assert_eq!(can_communicate(a, b, range), can_communicate(b, a, range));
        }
    }

    #[test]
    fn pairs_are_unordered_and_sorted() {
        let positions = [
            Position::new(0, 0),
            Position::new(2, 2),
            Position::new(8, 8),
            Position::new(1, 0),
        ];
        assert_eq!(neighbor_pairs(&positions, 4), vec![(0, 1), (0, 3), (1, 3)]);
        assert!(neighbor_pairs(&positions, 0).is_empty());
    }

    #[test]
    fn single_agent_has_no_pairs() {
        assert!(neighbor_pairs(&[Position::new(4, 4)], 4).is_empty());
    }
}
