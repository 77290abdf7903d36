// src/diagnostics.rs

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::eigen::EigenDecomposition;

/// Numeric health of a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub n_samples: usize,
    pub n_features: usize,
    pub n_retained: usize,
    /// max_j |mean of centered column j|
    pub centered_max_abs_column_mean: f64,
    /// max_{i<j} |cov[i][j] - cov[j][i]|
    pub covariance_max_asymmetry: f64,
    /// max_k ||M v_k - lambda_k v_k||_2
    pub max_eigen_residual: f64,
    /// ||V V^T - I||_F over all eigenvectors (rows of V)
    pub eigenvector_orthogonality_error: Option<f64>,
    pub max_discarded_imaginary: f64,
    /// Trace of the covariance matrix, i.e. the total variance of the data.
    pub total_variance: f64,
}

/// Computes Frobenius norm for an f64 matrix.
pub fn compute_frob_norm_f64(matrix: &ArrayView2<f64>) -> f64 {
    matrix.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Computes orthogonality error ||I - V V^T||_F where the vectors are the
/// rows of `rows`. Returns `None` for an empty matrix.
pub fn compute_orthogonality_error_f64(rows: &ArrayView2<f64>) -> Option<f64> {
    if rows.nrows() == 0 || rows.ncols() == 0 {
        return None;
    }
    let vvt = rows.dot(&rows.t());
    let identity = Array2::<f64>::eye(vvt.nrows());
    let diff = identity - vvt;
    Some(compute_frob_norm_f64(&diff.view()))
}

/// ||M v - lambda v||_2
pub fn eigen_residual(matrix: &ArrayView2<f64>, lambda: f64, vector: &ArrayView1<f64>) -> f64 {
    let mv = matrix.dot(vector);
    mv.iter()
        .zip(vector.iter())
        .map(|(a, b)| (a - lambda * b).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Largest residual over all eigen-pairs; 0 for an empty decomposition.
pub fn max_eigen_residual(matrix: &ArrayView2<f64>, decomposition: &EigenDecomposition) -> f64 {
    decomposition
        .pairs()
        .map(|(lambda, v)| eigen_residual(matrix, lambda, &v))
        .fold(0.0, f64::max)
}

pub fn max_asymmetry(matrix: &ArrayView2<f64>) -> f64 {
    let n = matrix.nrows().min(matrix.ncols());
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((matrix[[i, j]] - matrix[[j, i]]).abs());
        }
    }
    worst
}

pub fn max_abs_column_mean(data: &ArrayView2<f64>) -> f64 {
    if data.nrows() == 0 {
        return 0.0;
    }
    data.columns()
        .into_iter()
        .map(|c| (c.sum() / c.len() as f64).abs())
        .fold(0.0, f64::max)
}

pub fn trace(matrix: &ArrayView2<f64>) -> f64 {
    matrix.diag().sum()
}

/// Sum of the sample variances (ddof = 1) of the columns of `data`.
/// Returns 0 when fewer than two rows are present.
pub fn total_sample_variance(data: &ArrayView2<f64>) -> f64 {
    if data.nrows() < 2 {
        return 0.0;
    }
    data.columns().into_iter().map(|c| c.var(1.0)).sum()
}
