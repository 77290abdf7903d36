// src/centering.rs

use log::debug;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::PcaError;

/// Builds a data matrix of shape (n_samples, n_features) from raw rows.
///
/// Every row must have the same, non-zero length. Row lengths are checked
/// before any value is copied, so a ragged input never reaches the numeric
/// stages.
///
/// # Errors
/// `InvalidInput` for zero rows or zero-width rows, `ShapeMismatch` when a
/// row's length differs from the first row's.
pub fn to_matrix(rows: &[Vec<f64>]) -> Result<Array2<f64>, PcaError> {
    let n_samples = rows.len();
    if n_samples == 0 {
        return Err(PcaError::invalid_input("data matrix has zero rows"));
    }
    let n_features = rows[0].len();
    if n_features == 0 {
        return Err(PcaError::invalid_input("data matrix has zero features"));
    }
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
        return Err(PcaError::shape_mismatch(format!(
            "row {} has {} entries, expected {}",
            idx,
            row.len(),
            n_features
        )));
    }

    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((n_samples, n_features), flat)
        .map_err(|e| PcaError::shape_mismatch(e.to_string()))
}

/// Arithmetic mean of each column.
pub fn column_means(data: ArrayView2<f64>) -> Result<Array1<f64>, PcaError> {
    data.mean_axis(Axis(0))
        .ok_or_else(|| PcaError::invalid_input("cannot take the mean of zero rows"))
}

/// Subtracts the per-column mean from every row, returning a new matrix of
/// the same shape whose columns all have (numerically) zero mean.
pub fn subtract_mean(data: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
    let means = column_means(data)?;
    debug!(
        "Centering {}x{} data matrix; column means {:?}",
        data.nrows(),
        data.ncols(),
        means
    );
    Ok(&data - &means)
}

/// Validates raw rows and centers them in one call.
pub fn subtract_mean_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>, PcaError> {
    let data = to_matrix(rows)?;
    subtract_mean(data.view())
}
