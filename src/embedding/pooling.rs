//! Mean pooling and L2 normalization of encoder output.

use ndarray::{Array1, ArrayView3, Axis};

/// Floor for the attention-mask sum, so an all-padding input pools to zeros.
pub const MASK_EPSILON: f32 = 1e-9;

/// Attention-mask-weighted mean over the sequence axis.
///
/// `hidden` has shape `[1, seq_len, hidden_dim]`; `attention_mask` has `seq_len` entries.
pub fn mean_pool(attention_mask: &[i64], hidden: ArrayView3<'_, f32>) -> Array1<f32> {
    let states = hidden.index_axis(Axis(0), 0);
    let weights: Array1<f32> = attention_mask.iter().map(|&m| m as f32).collect();

    let summed = weights.dot(&states);
    let count = weights.sum().max(MASK_EPSILON);
    summed / count
}

/// Divide `vector` by its L2 norm. A zero vector yields NaNs; callers check.
pub fn l2_normalize(vector: Array1<f32>) -> Array1<f32> {
    let norm = vector.dot(&vector).sqrt();
    vector / norm
}
