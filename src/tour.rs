//! Tour representation and the shared permutation operators.
//!
//! A [`Tour`] is a permutation of all city indices with a cached cost. The
//! operators here are the common currency of all three engines: random tour
//! generation, ordered crossover (OX), per-position swap mutation, and the
//! swap-sequence machinery the PSO engine uses as its velocity.
//!
//! Every operator yields a valid permutation; a tour that misses or
//! duplicates a city is an internal defect, not a recoverable error.

use crate::instance::TspInstance;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// A candidate solution: an ordering of all city indices plus its cached cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    /// Visit order; each city index appears exactly once
    pub order: Vec<usize>,
    /// Cached tour length; `f64::INFINITY` until evaluated
    pub cost: f64,
}

impl Tour {
    /// Wrap an explicit ordering. Cost is unset until [`Tour::evaluate`].
    pub fn new(order: Vec<usize>) -> Self {
        Tour {
            order,
            cost: f64::INFINITY,
        }
    }

    /// Uniformly random permutation of `0..n`.
    pub fn random<R: Rng>(n: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        Tour::new(order)
    }

    /// Compute and cache the tour length against the instance's current
    /// distance matrix.
    pub fn evaluate(&mut self, instance: &TspInstance) -> f64 {
        self.cost = instance.tour_length(&self.order);
        self.cost
    }

    /// Mark the cached cost stale (city order or geometry changed).
    pub fn invalidate(&mut self) {
        self.cost = f64::INFINITY;
    }

    /// Number of cities in the tour.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// True if the order is a permutation of `0..len` (no missing or
    /// duplicate city).
    pub fn is_permutation(&self) -> bool {
        let n = self.order.len();
        let mut seen = vec![false; n];
        for &city in &self.order {
            if city >= n || seen[city] {
                return false;
            }
            seen[city] = true;
        }
        true
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.order.len() < 15 {
            write!(f, "Tour: {:?} Cost: {:.2}", self.order, self.cost)
        } else {
            write!(
                f,
                "Tour: [{} .. {} cities .. {}] Cost: {:.2}",
                self.order[0],
                self.order.len(),
                self.order[self.order.len() - 1],
                self.cost
            )
        }
    }
}

/// Ordered crossover (OX).
///
/// Copies a contiguous random slice of `parent_a` into the child at the same
/// positions, then fills the remaining positions left to right with
/// `parent_b`'s cities in `parent_b`'s relative order, skipping cities
/// already present. Always produces a valid permutation.
pub fn ordered_crossover<R: Rng>(parent_a: &Tour, parent_b: &Tour, rng: &mut R) -> Tour {
    let n = parent_a.len();
    if n < 2 {
        return Tour::new(parent_a.order.clone());
    }

    let a = rng.gen_range(0..n);
    let b = rng.gen_range(0..n);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };

    let mut child = vec![usize::MAX; n];
    let mut in_segment = vec![false; n];
    for i in start..=end {
        child[i] = parent_a.order[i];
        in_segment[parent_a.order[i]] = true;
    }

    let mut donor = parent_b.order.iter().filter(|&&c| !in_segment[c]);
    for slot in child.iter_mut() {
        if *slot == usize::MAX {
            // The donor always has exactly as many unused cities as there
            // are empty slots.
            *slot = *donor.next().unwrap();
        }
    }

    let child = Tour::new(child);
    debug_assert!(child.is_permutation());
    child
}

/// Per-position swap mutation.
///
/// Each position independently swaps with another random position with
/// probability `rate`. Swapping positions of a permutation cannot invalidate
/// it.
pub fn swap_mutate<R: Rng>(tour: &mut Tour, rate: f64, rng: &mut R) {
    let n = tour.len();
    if n < 2 {
        return;
    }

    let mut mutated = false;
    for i in 0..n {
        if rng.gen::<f64>() < rate {
            // Pick a partner distinct from i
            let j = (i + 1 + rng.gen_range(0..n - 1)) % n;
            tour.order.swap(i, j);
            mutated = true;
        }
    }

    if mutated {
        tour.invalidate();
    }
}

/// Sequence of position swaps that transforms `current` into `target`.
///
/// Applying the returned swaps to `current` in order yields exactly
/// `target`. Used by the PSO engine to express velocity toward a best tour.
pub fn swap_sequence_toward(current: &[usize], target: &[usize]) -> Vec<(usize, usize)> {
    let n = current.len();
    let mut work = current.to_vec();
    // position[c] = index of city c in `work`
    let mut position = vec![0usize; n];
    for (i, &c) in work.iter().enumerate() {
        position[c] = i;
    }

    let mut swaps = Vec::new();
    for i in 0..n {
        if work[i] != target[i] {
            let j = position[target[i]];
            swaps.push((i, j));
            position[work[i]] = j;
            position[work[j]] = i;
            work.swap(i, j);
        }
    }

    swaps
}

/// Apply position swaps in order. Swaps keep a permutation valid.
pub fn apply_swaps(order: &mut [usize], swaps: &[(usize, usize)]) {
    for &(i, j) in swaps {
        order.swap(i, j);
    }
}
