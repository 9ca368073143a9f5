//! Random forest regressor
//!
//! Bootstrap-aggregated regression trees. Each tree draws its bootstrap sample
//! and its feature order from a ChaCha8 stream seeded with `seed + tree_index`,
//! so a fit is fully determined by the data and the base seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::decision_tree::{RegressionTree, TreeConfig};
use super::DEFAULT_SEED;

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Per-tree growth limits
    pub tree: TreeConfig,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeConfig::default(),
            bootstrap: true,
            seed: DEFAULT_SEED,
        }
    }
}

/// Random forest model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Train the forest
    ///
    /// Returns an error message if the inputs are empty, ragged, or contain
    /// non-finite values.
    pub fn fit(&mut self, samples: &[Vec<f64>], targets: &[f64]) -> Result<(), String> {
        if samples.is_empty() {
            return Err("cannot fit on an empty dataset".to_string());
        }
        if samples.len() != targets.len() {
            return Err(format!(
                "{} samples but {} targets",
                samples.len(),
                targets.len()
            ));
        }
        if self.config.n_estimators == 0 {
            return Err("n_estimators must be at least 1".to_string());
        }

        let n_features = samples[0].len();
        if n_features == 0 || samples.iter().any(|s| s.len() != n_features) {
            return Err("samples must share a non-zero feature count".to_string());
        }
        if samples.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err("samples and targets must be finite".to_string());
        }

        let n = samples.len();
        let trees = (0..self.config.n_estimators)
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(i as u64));

                let indices: Vec<usize> = if self.config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };

                let mut tree = RegressionTree::new(self.config.tree.clone());
                tree.fit(samples, targets, &indices, &mut rng);
                tree
            })
            .collect();

        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    /// Mean prediction across trees (0.0 if unfitted)
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }

        self.trees.iter().map(|t| t.predict_one(features)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict(&self, samples: &[Vec<f64>]) -> Vec<f64> {
        samples.iter().map(|s| self.predict_one(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut samples = Vec::new();
        let mut targets = Vec::new();
        for month in 1..=12 {
            for budget in [2000.0, 4000.0, 6000.0, 8000.0] {
                samples.push(vec![month as f64, budget]);
                let seasonal = if month == 12 { 500.0 } else { 0.0 };
                targets.push(budget * 0.8 + seasonal);
            }
        }
        (samples, targets)
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (samples, targets) = seasonal_data();

        let mut a = RandomForest::new(ForestConfig::default());
        a.fit(&samples, &targets).unwrap();
        let mut b = RandomForest::new(ForestConfig::default());
        b.fit(&samples, &targets).unwrap();

        assert_eq!(a, b);
        for query in [[1.0, 3000.0], [12.0, 7000.0], [6.0, 10_000.0]] {
            assert_eq!(a.predict_one(&query), b.predict_one(&query));
        }
    }

    #[test]
    fn test_prediction_tracks_budget() {
        let (samples, targets) = seasonal_data();
        let mut forest = RandomForest::new(ForestConfig::default());
        forest.fit(&samples, &targets).unwrap();

        assert_eq!(forest.n_trees(), 100);
        assert_eq!(forest.n_features(), 2);

        let low = forest.predict_one(&[5.0, 2000.0]);
        let high = forest.predict_one(&[5.0, 8000.0]);
        assert!(high > low);
        // Predictions stay within the range of observed targets
        assert!(low >= 1600.0 - 1e-9);
        assert!(high <= 6900.0 + 1e-9);
    }

    #[test]
    fn test_different_seed_changes_model() {
        let (samples, targets) = seasonal_data();
        let mut a = RandomForest::new(ForestConfig::default());
        a.fit(&samples, &targets).unwrap();
        let mut b = RandomForest::new(ForestConfig {
            seed: 7,
            ..Default::default()
        });
        b.fit(&samples, &targets).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let mut forest = RandomForest::new(ForestConfig::default());
        assert!(forest.fit(&[], &[]).is_err());
        assert!(forest.fit(&[vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
        assert!(forest.fit(&[vec![1.0, f64::NAN]], &[1.0]).is_err());
        assert!(!forest.is_fitted());
        assert_eq!(forest.predict_one(&[1.0, 2.0]), 0.0);
    }
}
