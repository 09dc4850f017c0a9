//! Online incremental mean
//!
//! Federated averaging folds one contribution at a time:
//!
//! ```text
//! acc_n = acc_{n-1} + (x_n - acc_{n-1}) / n
//! ```
//!
//! Every contribution carries equal weight and all contributions are assumed to have
//! the same shape. This is not a weighted average.

use super::Reducer;
use anyhow::Context;
use std::sync::OnceLock;

/// Fold `next` into `accumulator` element-wise as the `sample_index`-th sample
///
/// Returns `false` and leaves `accumulator` untouched when the slices differ in length.
///
/// # Example
///
/// ```
/// use roundfold::contribution::incremental_mean;
///
/// let mut acc = vec![1.0, 2.0];
/// assert!(incremental_mean(&mut acc, &[3.0, 4.0], 2));
/// assert_eq!(acc, vec![2.0, 3.0]);
/// ```
pub fn incremental_mean(accumulator: &mut [f64], next: &[f64], sample_index: usize) -> bool {
    if accumulator.len() != next.len() {
        return false;
    }

    let n = sample_index.max(1) as f64;
    for (acc, x) in accumulator.iter_mut().zip(next) {
        *acc += (x - *acc) / n;
    }
    true
}

/// Reducer over dense `f64` vectors encoded with bincode
///
/// Every decoded vector must match the reducer's dimension, so the accumulator never
/// sees a shape mismatch. `new()` pins the dimension from the first payload that
/// decodes; it stays pinned for the lifetime of the reducer.
#[derive(Debug, Clone, Default)]
pub struct DenseVectorReducer {
    dimension: OnceLock<usize>,
}

impl DenseVectorReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require every decoded vector to have exactly `dimension` elements
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: OnceLock::from(dimension),
        }
    }

    /// Encode a vector in the payload format this reducer decodes
    pub fn encode(values: &[f64]) -> crate::Result<Vec<u8>> {
        bincode::serialize(values).context("Failed to encode dense vector")
    }
}

impl Reducer for DenseVectorReducer {
    type Model = Vec<f64>;

    fn decode(&self, bytes: &[u8]) -> Result<Vec<f64>, String> {
        let values: Vec<f64> = bincode::deserialize(bytes).map_err(|e| e.to_string())?;

        if values.iter().any(|v| !v.is_finite()) {
            return Err("payload contains non-finite values".to_string());
        }

        let dim = *self.dimension.get_or_init(|| values.len());
        if values.len() != dim {
            return Err(format!("expected {} elements, got {}", dim, values.len()));
        }

        Ok(values)
    }

    fn fold(&self, mut accumulator: Vec<f64>, next: Vec<f64>, sample_index: usize) -> Vec<f64> {
        let folded = incremental_mean(&mut accumulator, &next, sample_index);
        debug_assert!(folded, "decode admits a single vector length per reducer");
        accumulator
    }
}
