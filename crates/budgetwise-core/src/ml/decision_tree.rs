//! CART regression tree
//!
//! Nodes are stored in a flat arena (children referenced by index) so that
//! very deep trees neither overflow the stack while fitting nor hit the JSON
//! nesting limit when the model is persisted.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Regression tree fitted by greedy variance reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    config: TreeConfig,
    nodes: Vec<Node>,
}

struct PendingNode {
    slot: usize,
    indices: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl RegressionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Fit on the rows of `samples` selected by `indices`
    ///
    /// `indices` may contain repeats (bootstrap samples). The RNG only decides
    /// the order in which candidate features are examined.
    pub fn fit(
        &mut self,
        samples: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) {
        self.nodes.clear();
        if indices.is_empty() {
            return;
        }

        let n_features = samples[indices[0]].len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        let mut stack = vec![PendingNode {
            slot: 0,
            indices: indices.to_vec(),
            depth: 0,
        }];

        while let Some(pending) = stack.pop() {
            let value = mean(targets, &pending.indices);

            let depth_exhausted = self
                .config
                .max_depth
                .map(|max| pending.depth >= max)
                .unwrap_or(false);

            if depth_exhausted
                || pending.indices.len() < self.config.min_samples_split
                || is_constant(targets, &pending.indices)
            {
                self.nodes[pending.slot] = Node::Leaf { value };
                continue;
            }

            match self.find_best_split(samples, targets, &pending.indices, n_features, rng) {
                Some(split) => {
                    let left_slot = self.nodes.len();
                    let right_slot = left_slot + 1;
                    self.nodes.push(Node::Leaf { value: 0.0 });
                    self.nodes.push(Node::Leaf { value: 0.0 });

                    self.nodes[pending.slot] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: left_slot,
                        right: right_slot,
                    };

                    stack.push(PendingNode {
                        slot: right_slot,
                        indices: split.right,
                        depth: pending.depth + 1,
                    });
                    stack.push(PendingNode {
                        slot: left_slot,
                        indices: split.left,
                        depth: pending.depth + 1,
                    });
                }
                None => self.nodes[pending.slot] = Node::Leaf { value },
            }
        }
    }

    /// Find the split that maximizes the reduction in squared error
    ///
    /// Sorting each candidate feature once and sweeping prefix sums keeps the
    /// search at O(n log n) per feature.
    fn find_best_split(
        &self,
        samples: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        n_features: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        if n < 2 * min_leaf {
            return None;
        }

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);
        features.truncate(self.config.max_features.unwrap_or(n_features).max(1));

        let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
        // Maximizing sum_l^2/n_l + sum_r^2/n_r is equivalent to minimizing SSE
        let parent_score = total_sum * total_sum / n as f64;

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature in &features {
            let mut order = indices.to_vec();
            order.sort_by(|&a, &b| samples[a][feature].total_cmp(&samples[b][feature]));

            let mut left_sum = 0.0;
            for pos in 1..n {
                left_sum += targets[order[pos - 1]];

                let lo = samples[order[pos - 1]][feature];
                let hi = samples[order[pos]][feature];
                if lo >= hi || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }

                let n_left = pos as f64;
                let n_right = (n - pos) as f64;
                let right_sum = total_sum - left_sum;
                let score = left_sum * left_sum / n_left + right_sum * right_sum / n_right;

                if score <= parent_score + 1e-12 {
                    continue;
                }
                if best.map(|(_, _, s)| score > s).unwrap_or(true) {
                    let mut threshold = (lo + hi) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some((feature, threshold, score));
                }
            }
        }

        let (feature, threshold, _) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| samples[i][feature] <= threshold);

        Some(BestSplit {
            feature,
            threshold,
            left,
            right,
        })
    }

    /// Predict for a single sample (0.0 if the tree was never fitted)
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        let mut slot = 0;
        loop {
            match self.nodes.get(slot) {
                None => return 0.0,
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    slot = if features.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn mean(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}

fn is_constant(targets: &[f64], indices: &[usize]) -> bool {
    let first = targets[indices[0]];
    indices.iter().all(|&i| (targets[i] - first).abs() < 1e-12)
}
