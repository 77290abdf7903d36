// src/eigen.rs

use float_cmp::approx_eq;
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1};

use crate::diagnostics::max_asymmetry;
use crate::error::PcaError;
use crate::linalg_backends::BackendEig;

/// Tolerances applied while normalizing a solver's output.
#[derive(Debug, Clone, Copy)]
pub struct EigenTolerances {
    /// Largest |m[i][j] - m[j][i]| accepted without a warning.
    pub symmetry: f64,
    /// Largest imaginary eigenvalue part discarded without a warning.
    pub imaginary: f64,
}

impl Default for EigenTolerances {
    fn default() -> Self {
        Self {
            symmetry: 1e-9,
            imaginary: 1e-9,
        }
    }
}

/// Eigenvalues and eigenvectors paired by position.
///
/// Row `k` of `eigenvectors` is the eigenvector of `eigenvalues[k]`, indexed
/// by original dimension. Order is whatever the solver produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    pub eigenvalues: Array1<f64>,
    /// Shape (p, p): one eigenvector per row.
    pub eigenvectors: Array2<f64>,
    /// Largest magnitude among the imaginary parts that were dropped.
    pub max_discarded_imaginary: f64,
}

impl EigenDecomposition {
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Iterates over (eigenvalue, eigenvector) pairs in stored order.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, ArrayView1<'_, f64>)> + '_ {
        self.eigenvalues.iter().copied().zip(self.eigenvectors.rows())
    }
}

/// Runs `backend` on a square matrix and reshapes its output.
///
/// Only the real parts of the eigenvalues and eigenvectors are kept. That is
/// exact for the symmetric real matrices this crate feeds in (their spectrum
/// is real); for other inputs the dropped parts are reported through `warn!`
/// and `max_discarded_imaginary` rather than silently ignored.
///
/// The solver's column-per-eigenvector layout is transposed so that each
/// eigenvector is a contiguous row.
///
/// # Errors
/// `DecompositionFailed` if the matrix is not square, the solver fails, or
/// the solver returns output of the wrong shape or with non-finite values.
pub fn decompose<B: BackendEig + ?Sized>(
    matrix: &Array2<f64>,
    backend: &B,
    tolerances: EigenTolerances,
) -> Result<EigenDecomposition, PcaError> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(PcaError::decomposition_failed(format!(
            "matrix must be square, got {}x{}",
            rows, cols
        )));
    }
    let p = rows;

    let asymmetry = max_asymmetry(&matrix.view());
    if asymmetry > tolerances.symmetry {
        warn!(
            "Eigen-decomposition input is not symmetric (max |m[i][j] - m[j][i]| = {:e}); imaginary parts may be discarded",
            asymmetry
        );
    }

    let raw = backend.eig(matrix).map_err(|e| PcaError::DecompositionFailed {
        message: e.to_string(),
        source: Some(e),
    })?;

    if raw.eigenvalues_re.len() != p
        || raw.eigenvalues_im.len() != p
        || raw.eigenvectors.dim() != (p, p)
    {
        return Err(PcaError::decomposition_failed(format!(
            "solver returned {} eigenvalues ({} imaginary parts) and a {:?} eigenvector matrix for a {}x{} input",
            raw.eigenvalues_re.len(),
            raw.eigenvalues_im.len(),
            raw.eigenvectors.dim(),
            p,
            p
        )));
    }
    if raw.eigenvalues_re.iter().chain(raw.eigenvectors.iter()).any(|v| !v.is_finite()) {
        return Err(PcaError::decomposition_failed(
            "solver returned non-finite eigenvalues or eigenvectors",
        ));
    }

    let max_discarded_imaginary = raw.eigenvalues_im.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if !approx_eq!(f64, max_discarded_imaginary, 0.0, epsilon = tolerances.imaginary) {
        let count = raw
            .eigenvalues_im
            .iter()
            .filter(|v| !approx_eq!(f64, **v, 0.0, epsilon = tolerances.imaginary))
            .count();
        warn!(
            "Discarding imaginary parts of {} eigenvalue(s), largest {:e}",
            count, max_discarded_imaginary
        );
    }

    let eigenvectors = raw.eigenvectors.t().as_standard_layout().into_owned();
    debug!("Eigen-decomposition of {}x{} matrix: eigenvalues {:?}", p, p, raw.eigenvalues_re);

    Ok(EigenDecomposition {
        eigenvalues: raw.eigenvalues_re,
        eigenvectors,
        max_discarded_imaginary,
    })
}
