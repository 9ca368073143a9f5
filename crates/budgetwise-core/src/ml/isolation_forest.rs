//! Isolation Forest anomaly detection
//!
//! Anomalies are easier to isolate: random axis-aligned splits separate them
//! from the bulk of the data in fewer steps, so their average path length
//! across trees is short and their anomaly score is high.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::{percentile, DEFAULT_SEED};

/// A node in an isolation tree
#[derive(Debug, Clone)]
enum IsolationNode {
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    /// Leaf node with size (number of samples that reached it)
    Leaf { size: usize },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: IsolationNode,
}

impl IsolationTree {
    fn build(data: &[&[f64]], max_depth: usize, rng: &mut ChaCha8Rng) -> Self {
        Self {
            root: Self::build_node(data, 0, max_depth, rng),
        }
    }

    fn build_node(
        data: &[&[f64]],
        depth: usize,
        max_depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> IsolationNode {
        let n_samples = data.len();
        if depth >= max_depth || n_samples <= 1 {
            return IsolationNode::Leaf { size: n_samples };
        }

        let n_features = data[0].len();
        let feature = rng.gen_range(0..n_features);

        let min_val = data.iter().map(|row| row[feature]).fold(f64::INFINITY, f64::min);
        let max_val = data
            .iter()
            .map(|row| row[feature])
            .fold(f64::NEG_INFINITY, f64::max);

        // Identical values cannot be isolated further
        if max_val <= min_val {
            return IsolationNode::Leaf { size: n_samples };
        }

        let threshold = if (max_val - min_val).is_finite() {
            rng.gen_range(min_val..max_val)
        } else {
            // The width overflows f64; interpolate without forming it
            debug!(min_val, max_val, "Split range overflows, interpolating threshold");
            let t: f64 = rng.gen();
            min_val * (1.0 - t) + max_val * t
        };

        let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
            data.iter().copied().partition(|row| row[feature] < threshold);

        if left.is_empty() || right.is_empty() {
            return IsolationNode::Leaf { size: n_samples };
        }

        IsolationNode::Internal {
            feature,
            threshold,
            left: Box::new(Self::build_node(&left, depth + 1, max_depth, rng)),
            right: Box::new(Self::build_node(&right, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, sample: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                IsolationNode::Leaf { size } => return depth as f64 + average_path_length(*size),
                IsolationNode::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] < *threshold {
                        left
                    } else {
                        right
                    };
                    depth += 1;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` items
fn average_path_length(n: usize) -> f64 {
    const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation Forest for anomaly detection
#[derive(Debug, Clone)]
pub struct IsolationForest {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum number of samples per tree
    pub max_samples: usize,
    /// Contamination rate (expected proportion of anomalies)
    pub contamination: f64,
    /// Random seed
    pub seed: u64,
    trees: Vec<IsolationTree>,
    /// Sub-sample size actually used during fit
    sample_size: usize,
    /// Scores strictly above this are anomalies
    threshold: Option<f64>,
    /// Scores of the samples passed to the last `fit`
    training_scores: Vec<f64>,
}

impl IsolationForest {
    pub fn new(n_estimators: usize, contamination: f64) -> Self {
        Self {
            n_estimators,
            max_samples: 256,
            contamination,
            seed: DEFAULT_SEED,
            trees: Vec::new(),
            sample_size: 0,
            threshold: None,
            training_scores: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Build the trees and derive the contamination threshold
    pub fn fit(&mut self, data: &[Vec<f64>]) {
        self.trees.clear();
        self.threshold = None;
        self.training_scores.clear();

        let n_samples = data.len();
        if n_samples == 0 || self.n_estimators == 0 {
            return;
        }

        let sample_size = self.max_samples.clamp(1, n_samples);
        let max_depth = (sample_size as f64).log2().ceil().max(1.0) as usize;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        self.trees = (0..self.n_estimators)
            .map(|_| {
                let subset: Vec<&[f64]> = rand::seq::index::sample(&mut rng, n_samples, sample_size)
                    .into_iter()
                    .map(|i| data[i].as_slice())
                    .collect();
                IsolationTree::build(&subset, max_depth, &mut rng)
            })
            .collect();
        self.sample_size = sample_size;

        self.training_scores = self.score_samples(data);
        self.threshold = percentile(&self.training_scores, 1.0 - self.contamination);
    }

    /// Scores computed for the training data during the last `fit`
    pub fn training_scores(&self) -> &[f64] {
        &self.training_scores
    }

    /// Anomaly scores in (0, 1]; higher means more anomalous
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![0.5; data.len()];
        }

        let normalizer = average_path_length(self.sample_size);

        data.iter()
            .map(|sample| {
                let avg_path = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(sample))
                    .sum::<f64>()
                    / self.trees.len() as f64;

                if normalizer > 0.0 {
                    2.0_f64.powf(-avg_path / normalizer)
                } else {
                    0.5
                }
            })
            .collect()
    }

    /// Flag each sample; `true` marks an anomaly
    pub fn predict(&self, data: &[Vec<f64>]) -> Vec<bool> {
        let Some(threshold) = self.threshold else {
            return vec![false; data.len()];
        };

        self.score_samples(data)
            .into_iter()
            .map(|score| score > threshold)
            .collect()
    }

    pub fn fit_predict(&mut self, data: &[Vec<f64>]) -> Vec<bool> {
        self.fit_predict_scored(data)
            .into_iter()
            .map(|(flagged, _)| flagged)
            .collect()
    }

    /// Fit, then flag each training sample alongside its score
    ///
    /// Reuses the scores computed while fitting instead of walking the
    /// trees again.
    pub fn fit_predict_scored(&mut self, data: &[Vec<f64>]) -> Vec<(bool, f64)> {
        self.fit(data);
        let threshold = self.threshold;
        self.training_scores
            .iter()
            .map(|&score| (threshold.is_some_and(|t| score > t), score))
            .collect()
    }
}
