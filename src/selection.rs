// src/selection.rs

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::cmp::Ordering;

use crate::eigen::EigenDecomposition;
use crate::error::PcaError;

/// Components whose eigenvalue is below this are dropped.
pub const DEFAULT_EIGENVALUE_THRESHOLD: f64 = 1.0;

/// The eigen-pairs kept for projection, largest eigenvalue first.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedBasis {
    pub eigenvalues: Array1<f64>,
    /// Shape (m, p): one retained eigenvector per row.
    pub eigenvectors: Array2<f64>,
}

impl RetainedBasis {
    /// Number of retained components (m).
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Length of each eigenvector (p).
    pub fn dimension(&self) -> usize {
        self.eigenvectors.ncols()
    }

    /// Applies the selection rule to a decomposition.
    pub fn from_decomposition(
        decomposition: &EigenDecomposition,
        threshold: f64,
    ) -> Result<Self, PcaError> {
        select_components(
            decomposition.eigenvalues.view(),
            decomposition.eigenvectors.view(),
            threshold,
        )
    }
}

/// Keeps the pairs with `eigenvalue >= threshold` and orders them by
/// eigenvalue, descending.
///
/// The sort is stable: equal eigenvalues keep their input order. Row `k` of
/// `eigenvectors` belongs to `eigenvalues[k]`. When nothing passes the
/// threshold the result is empty (zero rows, `p` columns), which is not an
/// error.
///
/// # Errors
/// `ShapeMismatch` if the number of eigenvalues and eigenvector rows differ.
pub fn select_components(
    eigenvalues: ArrayView1<f64>,
    eigenvectors: ArrayView2<f64>,
    threshold: f64,
) -> Result<RetainedBasis, PcaError> {
    if eigenvalues.len() != eigenvectors.nrows() {
        return Err(PcaError::shape_mismatch(format!(
            "{} eigenvalues but {} eigenvectors",
            eigenvalues.len(),
            eigenvectors.nrows()
        )));
    }
    let p = eigenvectors.ncols();

    let mut kept: Vec<(f64, ArrayView1<f64>)> = eigenvalues
        .iter()
        .copied()
        .zip(eigenvectors.rows())
        .filter(|(value, _)| *value >= threshold)
        .collect();
    kept.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let m = kept.len();
    let values: Vec<f64> = kept.iter().map(|(value, _)| *value).collect();
    let flat: Vec<f64> = kept.iter().flat_map(|(_, row)| row.iter().copied()).collect();
    let vectors = Array2::from_shape_vec((m, p), flat)
        .map_err(|e| PcaError::shape_mismatch(e.to_string()))?;

    debug!(
        "Retained {} of {} components (threshold {}): {:?}",
        m,
        eigenvalues.len(),
        threshold,
        values
    );
    Ok(RetainedBasis {
        eigenvalues: Array1::from(values),
        eigenvectors: vectors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn filters_and_sorts_descending() {
        let values = array![0.5, 3.0, 1.0, 2.0];
        let vectors = array![[0.0, 0.0], [3.0, 3.0], [1.0, 1.0], [2.0, 2.0]];
        let basis = select_components(values.view(), vectors.view(), DEFAULT_EIGENVALUE_THRESHOLD).unwrap();
        assert_eq!(basis.eigenvalues, array![3.0, 2.0, 1.0]);
        assert_eq!(basis.eigenvectors, array![[3.0, 3.0], [2.0, 2.0], [1.0, 1.0]]);
        assert_eq!(basis.dimension(), 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let values = array![2.0, 5.0, 2.0, 2.0];
        let vectors = array![[1.0], [2.0], [3.0], [4.0]];
        let basis = select_components(values.view(), vectors.view(), 1.0).unwrap();
        assert_eq!(basis.eigenvalues, array![5.0, 2.0, 2.0, 2.0]);
        assert_eq!(basis.eigenvectors, array![[2.0], [1.0], [3.0], [4.0]]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let values = array![1.0, 0.999_999];
        let vectors = Array2::<f64>::eye(2);
        let basis = select_components(values.view(), vectors.view(), 1.0).unwrap();
        assert_eq!(basis.eigenvalues, array![1.0]);
    }

    #[test]
    fn nothing_retained_is_empty_not_error() {
        let values = array![0.2, 0.9];
        let vectors = Array2::<f64>::eye(2);
        let basis = select_components(values.view(), vectors.view(), 1.0).unwrap();
        assert!(basis.is_empty());
        assert_eq!(basis.eigenvectors.dim(), (0, 2));
    }

    #[test]
    fn selection_is_idempotent() {
        let values = array![1.5, 0.1, 7.0, 1.5, 3.0];
        let vectors = Array2::from_shape_fn((5, 3), |(i, j)| (i * 3 + j) as f64);
        let once = select_components(values.view(), vectors.view(), 1.0).unwrap();
        let twice = select_components(once.eigenvalues.view(), once.eigenvectors.view(), 1.0).unwrap();
        assert_eq!(once, twice);
        assert!(once.eigenvalues.iter().all(|&v| v >= 1.0));
        assert!(once.eigenvalues.windows(2).into_iter().all(|w| w[0] >= w[1]));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let values = array![1.0, 2.0, 3.0];
        let vectors = Array2::<f64>::eye(2);
        let err = select_components(values.view(), vectors.view(), 1.0).unwrap_err();
        assert!(err.is_shape_mismatch());
    }
}
