//! Integer apportionment of groups of rows among the sets of a split.
//!
//! Every exact share `fraction * group_size` is rounded down first. The remaining rows are then
//! handed out one at a time along augmenting paths (in the style of Edmonds-Karp) in a
//! bipartite network of groups and sets: a group may round up at most once per set, and every
//! set may round up only as often as its own fractional total allows.

use std::collections::VecDeque;

/// Guards the conversion of fractional counts against floating point noise
pub(super) const SIZE_EPS: f64 = 1e-9;

/// Distributes the members of every group among `S` sets with the given fractions, which
/// have to sum to `1`.
///
/// Returns `counts[g][s]`, the number of members of group `g` assigned to set `s`, where
/// - every row sums to its group size,
/// - every count is the floor or the ceiling of `fractions[s] * groups[g]`,
/// - the total of set `s` is the floor or the ceiling of `fractions[s] * groups.sum()`.
///
/// Earlier sets are preferred when totals are rounded up. Returns `None` only if the
/// fractions do not sum to `1`.
pub(super) fn apportion<const S: usize>(
    groups: &[usize],
    fractions: [f64; S],
) -> Option<Vec<[usize; S]>> {
    let n: usize = groups.iter().sum();

    let mut floors: Vec<[usize; S]> = Vec::with_capacity(groups.len());
    let mut rounding = Rounding::<S>::with_capacity(groups.len());
    for &size in groups {
        let exact = fractions.map(|f| f * size as f64);
        let floor = exact.map(|x| (x + SIZE_EPS).floor().max(0.0) as usize);

        rounding
            .eligible
            .push(std::array::from_fn(|s| exact[s] - floor[s] as f64 > SIZE_EPS));
        rounding.up.push([false; S]);
        rounding
            .missing
            .push(size.checked_sub(floor.iter().sum())?);
        floors.push(floor);
    }

    // fractional mass every set still has to receive
    let residual: [f64; S] = std::array::from_fn(|s| {
        fractions[s] * n as f64 - floors.iter().map(|f| f[s]).sum::<usize>() as f64
    });

    let mut capacity = residual.map(|r| (r + SIZE_EPS).floor().max(0.0) as usize);
    rounding.saturate(&capacity);
    for s in 0..S {
        capacity[s] = (residual[s] - SIZE_EPS).ceil().max(0.0) as usize;
        rounding.saturate(&capacity);
    }

    if rounding.missing.iter().any(|&m| m > 0) {
        return None;
    }

    Some(
        floors
            .into_iter()
            .zip(rounding.up)
            .map(|(floor, up)| std::array::from_fn(|s| floor[s] + up[s] as usize))
            .collect(),
    )
}

/// Bipartite flow of round-ups from groups to sets
struct Rounding<const S: usize> {
    /// `eligible[g][s]` iff the share of group `g` in set `s` is fractional
    eligible: Vec<[bool; S]>,
    /// `up[g][s]` iff the share of group `g` in set `s` is rounded up
    up: Vec<[bool; S]>,
    /// Number of round-ups group `g` still needs
    missing: Vec<usize>,
    /// Number of round-ups set `s` received
    assigned: [usize; S],
}

impl<const S: usize> Rounding<S> {
    fn with_capacity(groups: usize) -> Self {
        Self {
            eligible: Vec::with_capacity(groups),
            up: Vec::with_capacity(groups),
            missing: Vec::with_capacity(groups),
            assigned: [0; S],
        }
    }

    fn saturate(&mut self, capacity: &[usize; S]) {
        while self.augment(capacity) {}
    }

    /// Searches a shortest augmenting path from a group that still needs a round-up to a set
    /// below its capacity, and flips the path. Returns `false` if there is none.
    fn augment(&mut self, capacity: &[usize; S]) -> bool {
        let mut set_pred: [Option<usize>; S] = [None; S];
        // `Some(None)` marks a group the search started from
        let mut group_pred: Vec<Option<Option<usize>>> = vec![None; self.missing.len()];

        let mut queue: VecDeque<usize> = VecDeque::new();
        for (g, &missing) in self.missing.iter().enumerate() {
            if missing > 0 {
                group_pred[g] = Some(None);
                queue.push_back(g);
            }
        }

        let mut target = None;
        'search: while let Some(g) = queue.pop_front() {
            for s in 0..S {
                if !self.eligible[g][s] || self.up[g][s] || set_pred[s].is_some() {
                    continue;
                }
                set_pred[s] = Some(g);

                if self.assigned[s] < capacity[s] {
                    target = Some(s);
                    break 'search;
                }

                for (h, up) in self.up.iter().enumerate() {
                    if up[s] && group_pred[h].is_none() {
                        group_pred[h] = Some(Some(s));
                        queue.push_back(h);
                    }
                }
            }
        }

        let Some(mut s) = target else {
            return false;
        };

        self.assigned[s] += 1;
        while let Some(g) = set_pred[s] {
            self.up[g][s] = true;
            match group_pred[g] {
                Some(Some(prev)) => {
                    self.up[g][prev] = false;
                    s = prev;
                }
                _ => {
                    self.missing[g] -= 1;
                    break;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn single_group() {
        for (n, expected) in [
            (10, [2, 3, 5]),
            (17, [4, 5, 8]),
            (100, [20, 30, 50]),
            (257, [52, 77, 128]),
        ] {
            assert_eq!(apportion(&[n], [0.2, 0.3, 0.5]), Some(vec![expected]));
        }
    }

    #[test]
    fn groups_share_round_ups() {
        assert_eq!(
            apportion(&[5, 5], [0.2, 0.3, 0.5]),
            Some(vec![[1, 2, 2], [1, 1, 3]])
        );
        assert_eq!(
            apportion(&[200, 100], [0.2, 0.3, 0.5]),
            Some(vec![[40, 60, 100], [20, 30, 50]])
        );
        assert_eq!(apportion(&[1, 1, 1], [0.5, 0.5]), Some(vec![[1, 0], [0, 1], [1, 0]]));
    }

    #[test]
    fn fractions_not_summing_to_one() {
        assert_eq!(apportion(&[10], [0.5, 0.6]), None);
    }

    #[test]
    fn random_groups_round_to_neighbors() {
        let rng = &mut Pcg64Mcg::seed_from_u64(5);

        for fractions in [
            [0.2, 0.3, 0.5],
            [0.1, 0.1, 0.8],
            [0.25, 0.15, 0.6],
            [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
        ] {
            for _ in 0..200 {
                let groups = (0..rng.random_range(1..8))
                    .map(|_| rng.random_range(1..80usize))
                    .collect::<Vec<_>>();
                let n: usize = groups.iter().sum();
                let counts = apportion(&groups, fractions).unwrap();

                for (&size, row) in groups.iter().zip(&counts) {
                    assert_eq!(row.iter().sum::<usize>(), size);
                    for (&count, f) in row.iter().zip(fractions) {
                        assert!((count as f64 - f * size as f64).abs() < 1.0);
                    }
                }

                for (s, f) in fractions.into_iter().enumerate() {
                    let total: usize = counts.iter().map(|row| row[s]).sum();
                    assert!((total as f64 - f * n as f64).abs() < 1.0);
                }
            }
        }
    }
}
