// src/projection.rs

use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::error::PcaError;
use crate::selection::RetainedBasis;

/// Projects centered data onto a set of eigenvectors.
///
/// * `centered` - shape (n, p).
/// * `eigenvectors` - shape (m, p), one component per row.
///
/// Returns the (n, m) matrix with `out[i][k] = sum_j centered[i][j] * eigenvectors[k][j]`.
/// An empty basis yields an (n, 0) matrix.
///
/// # Errors
/// `ShapeMismatch` if the eigenvector length differs from the number of
/// columns of `centered`.
pub fn project(centered: ArrayView2<f64>, eigenvectors: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
    let (n_samples, n_features) = centered.dim();
    let (n_components, vector_len) = eigenvectors.dim();
    if vector_len != n_features {
        return Err(PcaError::shape_mismatch(format!(
            "eigenvectors have length {}, data has {} features",
            vector_len, n_features
        )));
    }
    if n_components == 0 {
        return Ok(Array2::zeros((n_samples, 0)));
    }
    debug!(
        "Projecting {}x{} data onto {} component(s)",
        n_samples, n_features, n_components
    );
    Ok(centered.dot(&eigenvectors.t()))
}

/// Projects centered data onto a retained basis.
pub fn project_onto_basis(centered: ArrayView2<f64>, basis: &RetainedBasis) -> Result<Array2<f64>, PcaError> {
    project(centered, basis.eigenvectors.view())
}
