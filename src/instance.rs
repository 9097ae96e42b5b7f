//! TSP instance representation: city coordinates and the distance matrix.
//!
//! Cities live on a rectangular grid. All pairwise distances are precomputed
//! into a symmetric matrix so that tour evaluation is a matrix lookup per
//! edge; when city positions change (dynamic mode) the matrix is rebuilt
//! wholesale with [`TspInstance::rebuild_distances`].

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A city on the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    /// City identifier (index into the distance matrix)
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl City {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        City { id, x, y }
    }
}

/// A TSP instance: cities, grid bounds and the precomputed distance matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TspInstance {
    /// Name of the instance (used in reports)
    pub name: String,
    /// Grid width
    pub width: f64,
    /// Grid height
    pub height: f64,
    /// All cities, indexed by id
    pub cities: Vec<City>,
    /// Precomputed symmetric distance matrix
    #[serde(skip)]
    pub distance_matrix: Vec<Vec<f64>>,
}

impl TspInstance {
    /// Build an instance from explicit coordinates.
    ///
    /// Fails for degenerate input: fewer than two cities or a non-positive
    /// grid dimension.
    pub fn from_coords(name: &str, coords: &[(f64, f64)], width: f64, height: f64) -> Result<Self, String> {
        if coords.len() < 2 {
            return Err(format!(
                "instance '{}' needs at least 2 cities, got {}",
                name,
                coords.len()
            ));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(format!(
                "instance '{}' needs positive grid dimensions, got {}x{}",
                name, width, height
            ));
        }

        let cities = coords
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| City::new(id, x, y))
            .collect();

        let mut instance = TspInstance {
            name: name.to_string(),
            width,
            height,
            cities,
            distance_matrix: Vec::new(),
        };
        instance.rebuild_distances();

        Ok(instance)
    }

    /// Generate an instance with uniformly random city positions.
    /// Deterministic for a given seed.
    pub fn random(num_cities: usize, width: f64, height: f64, seed: u64) -> Result<Self, String> {
        if num_cities < 2 {
            return Err(format!("instance needs at least 2 cities, got {}", num_cities));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(format!(
                "instance needs positive grid dimensions, got {}x{}",
                width, height
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let coords: Vec<(f64, f64)> = (0..num_cities)
            .map(|_| (rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
            .collect();

        Self::from_coords(&format!("random-{}", num_cities), &coords, width, height)
    }

    /// Recompute the full distance matrix from current city positions.
    ///
    /// Any tour cost cached before this call is stale and must be
    /// re-evaluated against the new matrix.
    pub fn rebuild_distances(&mut self) {
        let n = self.cities.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = self.cities[i].x - self.cities[j].x;
                let dy = self.cities[i].y - self.cities[j].y;
                let dist = (dx * dx + dy * dy).sqrt();
                matrix[i][j] = dist;
                matrix[j][i] = dist;
            }
        }

        self.distance_matrix = matrix;
    }

    /// Distance between two cities via the precomputed matrix.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Number of cities.
    #[inline]
    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    /// Total length of a closed tour, including the wrap-around edge from
    /// the last city back to the first.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        let n = tour.len();
        if n < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for i in 0..n {
            length += self.distance(tour[i], tour[(i + 1) % n]);
        }

        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_matrix_symmetric_zero_diagonal() {
        let coords = vec![(0.0, 0.0), (3.0, 4.0), (1.0, 1.0), (3.0, 4.0)];
        let instance = TspInstance::from_coords("test", &coords, 10.0, 10.0).unwrap();

        let n = instance.num_cities();
        for i in 0..n {
            assert_eq!(instance.distance(i, i), 0.0);
            for j in 0..n {
                assert_eq!(instance.distance(i, j), instance.distance(j, i));
                assert!(instance.distance(i, j) >= 0.0);
            }
        }
        // Duplicate coordinates give zero distance off the diagonal too
        assert_eq!(instance.distance(1, 3), 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let coords = vec![(0.0, 0.0), (3.0, 4.0)];
        let instance = TspInstance::from_coords("test", &coords, 10.0, 10.0).unwrap();

        assert!((instance.distance(0, 1) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_tour_length_includes_wraparound() {
        // Unit square: perimeter tour has length 4
        let coords = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let instance = TspInstance::from_coords("square", &coords, 2.0, 2.0).unwrap();

        let cost = instance.tour_length(&[0, 1, 2, 3]);
        assert!((cost - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_rejects_degenerate_instances() {
        assert!(TspInstance::from_coords("one", &[(0.0, 0.0)], 10.0, 10.0).is_err());
        assert!(TspInstance::from_coords("flat", &[(0.0, 0.0), (1.0, 1.0)], 0.0, 10.0).is_err());
        assert!(TspInstance::random(1, 10.0, 10.0, 1).is_err());
        assert!(TspInstance::random(5, 10.0, -1.0, 1).is_err());
    }

    #[test]
    fn test_random_generation_is_deterministic() {
        let a = TspInstance::random(20, 100.0, 100.0, 7).unwrap();
        let b = TspInstance::random(20, 100.0, 100.0, 7).unwrap();

        for (ca, cb) in a.cities.iter().zip(b.cities.iter()) {
            assert_eq!(ca.x, cb.x);
            assert_eq!(ca.y, cb.y);
        }
    }

    #[test]
    fn test_rebuild_after_move() {
        let coords = vec![(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)];
        let mut instance = TspInstance::from_coords("test", &coords, 10.0, 10.0).unwrap();
        let before = instance.distance(0, 1);

        instance.cities[1].x = 0.0;
        instance.cities[1].y = 1.0;
        instance.rebuild_distances();

        assert_ne!(before, instance.distance(0, 1));
        assert!((instance.distance(0, 1) - 1.0).abs() < 1e-10);
    }
}
