// src/covariance.rs

use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::error::PcaError;

/// Sample covariance of two equal-length sequences.
///
/// Both inputs are re-centered on their own mean, so callers may pass raw
/// or already centered columns. The sum of products of deviations is divided
/// by `len - 1`.
///
/// # Errors
/// `ShapeMismatch` if the lengths differ, `InvalidInput` if fewer than two
/// values are supplied.
pub fn covariance(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<f64, PcaError> {
    if x.len() != y.len() {
        return Err(PcaError::shape_mismatch(format!(
            "covariance inputs have different lengths ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    let len = x.len();
    if len < 2 {
        return Err(PcaError::invalid_input(format!(
            "covariance needs at least 2 observations, got {}",
            len
        )));
    }

    let mean_x = x.sum() / len as f64;
    let mean_y = y.sum() / len as f64;
    let cross: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&a, &b)| (a - mean_x) * (b - mean_y))
        .sum();
    Ok(cross / (len - 1) as f64)
}

/// Builds the (p, p) sample covariance matrix of `data`, whose columns are
/// the original dimensions.
///
/// Only the upper triangle is evaluated; the lower triangle is mirrored from
/// it so the result is exactly symmetric. With `parallel` set, the entries
/// are computed on the rayon pool and written back in index order, so the
/// result does not depend on scheduling.
pub fn covariance_matrix(data: ArrayView2<f64>, parallel: bool) -> Result<Array2<f64>, PcaError> {
    let (n_samples, n_features) = data.dim();
    if n_features == 0 {
        return Err(PcaError::invalid_input("data matrix has zero features"));
    }
    if n_samples < 2 {
        return Err(PcaError::invalid_input(format!(
            "covariance needs at least 2 observations, got {}",
            n_samples
        )));
    }

    let pairs: Vec<(usize, usize)> = (0..n_features)
        .flat_map(|i| (i..n_features).map(move |j| (i, j)))
        .collect();

    let entry = |&(i, j): &(usize, usize)| -> Result<f64, PcaError> {
        covariance(data.column(i), data.column(j))
    };
    let values: Vec<f64> = if parallel {
        pairs.par_iter().map(entry).collect::<Result<_, _>>()?
    } else {
        pairs.iter().map(entry).collect::<Result<_, _>>()?
    };

    let mut cov = Array2::<f64>::zeros((n_features, n_features));
    for (&(i, j), value) in pairs.iter().zip(values) {
        cov[[i, j]] = value;
        cov[[j, i]] = value;
    }
    debug!(
        "Covariance matrix {}x{} from {} samples (parallel: {})",
        n_features, n_features, n_samples, parallel
    );
    Ok(cov)
}
