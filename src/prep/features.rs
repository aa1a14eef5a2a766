//! Post-processing of dense feature matrices.

use ndarray::{Array2, Axis};

/// Sets every non-zero feature to `1`
pub fn binarize(features: &mut Array2<f32>) {
    features.mapv_inplace(|x| if x != 0.0 { 1.0 } else { 0.0 });
}

/// Divides every row by its sum. Rows summing to zero are left unchanged.
pub fn row_norm(features: &mut Array2<f32>) {
    for mut row in features.axis_iter_mut(Axis(0)) {
        let sum = row.sum();
        if sum != 0.0 {
            row.mapv_inplace(|x| x / sum);
        }
    }
}
