//! Dynamic city movement for the dynamic TSP variant.
//!
//! Each city moves independently through a series of segments: it picks a
//! random target on the grid, interpolates linearly toward it over a random
//! duration of 150-300 ticks, then picks the next target. A move that would
//! bring two cities closer than the minimum separation is rejected and the
//! target replaced; if no acceptable target is found within the retry
//! budget, the city holds its position for one tick.
//!
//! Advancement is deterministic for a given seed and must run before any
//! engine evaluates tours in a tick; the caller re-scores all stored tours
//! against the rebuilt distance matrix afterwards.

use crate::instance::TspInstance;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Shortest movement segment, in ticks.
const MIN_SEGMENT_TICKS: usize = 150;
/// Longest movement segment, in ticks.
const MAX_SEGMENT_TICKS: usize = 300;
/// Target replacements attempted before a city holds for one tick.
const MAX_TARGET_RETRIES: usize = 10;

/// One city's movement segment.
#[derive(Debug, Clone)]
struct Segment {
    /// Position when this segment began
    start: (f64, f64),
    /// Target position
    target: (f64, f64),
    /// Ticks already moved along this segment
    step: usize,
    /// Segment length in ticks
    duration: usize,
}

/// Moves cities between random targets with collision avoidance.
pub struct DynamicCities {
    min_separation: f64,
    width: f64,
    height: f64,
    seed: u64,
    rng: ChaCha8Rng,
    initial_positions: Vec<(f64, f64)>,
    segments: Vec<Segment>,
    tick: usize,
}

impl DynamicCities {
    /// Set up movement state for every city of the instance.
    ///
    /// The minimum separation is 1% of the grid's larger dimension.
    pub fn new(instance: &TspInstance, seed: u64) -> Self {
        let initial_positions: Vec<(f64, f64)> =
            instance.cities.iter().map(|c| (c.x, c.y)).collect();

        let mut model = DynamicCities {
            min_separation: 0.01 * instance.width.max(instance.height),
            width: instance.width,
            height: instance.height,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            initial_positions,
            segments: Vec::new(),
            tick: 0,
        };
        model.segments = model
            .initial_positions
            .clone()
            .into_iter()
            .map(|pos| model.fresh_segment(pos))
            .collect();
        model
    }

    /// Current tick counter.
    pub fn tick(&self) -> usize {
        self.tick
    }

    /// Minimum allowed distance between any two cities.
    pub fn min_separation(&self) -> f64 {
        self.min_separation
    }

    /// Advance every city by one tick and rebuild the instance's distance
    /// matrix. All tour costs cached before this call are stale.
    pub fn advance(&mut self, instance: &mut TspInstance) {
        self.tick += 1;

        for i in 0..self.segments.len() {
            let current = (instance.cities[i].x, instance.cities[i].y);

            // Segment finished: continue from wherever the city is now
            if self.segments[i].step >= self.segments[i].duration {
                self.segments[i] = self.fresh_segment(current);
            }

            let mut placed = false;
            for _ in 0..MAX_TARGET_RETRIES {
                let candidate = self.next_position(i);
                if !self.collides(instance, i, candidate) {
                    instance.cities[i].x = candidate.0;
                    instance.cities[i].y = candidate.1;
                    self.segments[i].step += 1;
                    placed = true;
                    break;
                }
                // Reject the move and replace the target; the replacement
                // segment restarts from the current position.
                self.segments[i] = self.fresh_segment(current);
            }

            if !placed {
                log::warn!(
                    "city {} found no collision-free target after {} retries; holding for one tick",
                    i,
                    MAX_TARGET_RETRIES
                );
            }
        }

        instance.rebuild_distances();
    }

    /// Restore initial positions and replay movements from the seed.
    pub fn reset(&mut self, instance: &mut TspInstance) {
        for (i, &(x, y)) in self.initial_positions.iter().enumerate() {
            instance.cities[i].x = x;
            instance.cities[i].y = y;
        }
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.tick = 0;
        self.segments = self
            .initial_positions
            .clone()
            .into_iter()
            .map(|pos| self.fresh_segment(pos))
            .collect();
        instance.rebuild_distances();
    }

    fn fresh_segment(&mut self, start: (f64, f64)) -> Segment {
        Segment {
            start,
            target: (
                self.rng.gen_range(0.0..self.width),
                self.rng.gen_range(0.0..self.height),
            ),
            step: 0,
            duration: self.rng.gen_range(MIN_SEGMENT_TICKS..=MAX_SEGMENT_TICKS),
        }
    }

    /// Where city `i` would land after one more tick along its segment.
    fn next_position(&self, i: usize) -> (f64, f64) {
        let seg = &self.segments[i];
        let progress = (seg.step + 1) as f64 / seg.duration as f64;
        (
            seg.start.0 + progress * (seg.target.0 - seg.start.0),
            seg.start.1 + progress * (seg.target.1 - seg.start.1),
        )
    }

    /// Would moving city `i` to `candidate` bring it under the minimum
    /// separation from any other city?
    fn collides(&self, instance: &TspInstance, i: usize, candidate: (f64, f64)) -> bool {
        instance.cities.iter().any(|other| {
            if other.id == i {
                return false;
            }
            let dx = candidate.0 - other.x;
            let dy = candidate.1 - other.y;
            (dx * dx + dy * dy).sqrt() < self.min_separation
        })
    }
}
