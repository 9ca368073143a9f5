//! Tree-ensemble primitives used by the forecasting engine
//!
//! - `decision_tree` - CART regression tree (variance reduction)
//! - `random_forest` - Bagged ensemble of regression trees
//! - `isolation_forest` - Unsupervised outlier scoring
//!
//! All randomness flows through seeded ChaCha8 generators so that two fits on
//! the same data produce identical models.

pub mod decision_tree;
pub mod isolation_forest;
pub mod random_forest;

pub use decision_tree::{RegressionTree, TreeConfig};
pub use isolation_forest::IsolationForest;
pub use random_forest::{ForestConfig, RandomForest};

/// Seed shared by every estimator in the engine
pub const DEFAULT_SEED: u64 = 42;

/// Linear-interpolated percentile of `values` (`q` in 0..=1)
///
/// Returns `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}
