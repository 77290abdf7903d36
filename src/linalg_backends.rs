// src/linalg_backends.rs

use log::{trace, warn};
use ndarray::{Array1, Array2};
use std::error::Error;

/// Errors surfaced by a backend. The eigen adapter turns these into
/// `PcaError::DecompositionFailed`.
pub type BackendError = Box<dyn Error + Send + Sync + 'static>;

// --- Trait Definitions ---

/// Raw output of an eigen-solver.
#[derive(Debug, Clone)]
pub struct EigOutput {
    /// Real parts of the eigenvalues, in solver order.
    pub eigenvalues_re: Array1<f64>,
    /// Imaginary parts of the eigenvalues. Symmetric solvers report zeros.
    pub eigenvalues_im: Array1<f64>,
    /// Eigenvectors as columns of the matrix (real parts).
    /// eigenvectors.column(i) corresponds to eigenvalues_re[i].
    pub eigenvectors: Array2<f64>,
}

/// Eigen-decomposition of a square real matrix.
///
/// Implementers may assume nothing beyond squareness; symmetric solvers are
/// free to read only the upper triangle.
pub trait BackendEig {
    fn eig(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError>;
}

impl<T: BackendEig + ?Sized> BackendEig for &T {
    fn eig(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
        (**self).eig(matrix)
    }
}

impl<T: BackendEig + ?Sized> BackendEig for Box<T> {
    fn eig(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
        (**self).eig(matrix)
    }
}

fn check_square(matrix: &Array2<f64>) -> Result<usize, BackendError> {
    if matrix.nrows() != matrix.ncols() {
        return Err(format!(
            "Matrix must be square for eigendecomposition, got {}x{}.",
            matrix.nrows(),
            matrix.ncols()
        )
        .into());
    }
    Ok(matrix.nrows())
}

// --- Jacobi Backend (pure Rust, symmetric matrices) ---

/// Cyclic Jacobi eigenvalue solver for real symmetric matrices.
///
/// Each sweep visits every off-diagonal pair (p, q) once and applies a
/// rotation that zeroes `a[p][q]`; the product of the rotations accumulates
/// into the eigenvector matrix. Iteration stops once the off-diagonal
/// Frobenius norm drops below `tolerance` times the matrix norm.
///
/// Only the symmetric part of the input is meaningful; callers should pass
/// symmetric matrices.
#[derive(Debug, Clone, Copy)]
pub struct JacobiBackend {
    pub max_sweeps: usize,
    pub tolerance: f64,
}

impl Default for JacobiBackend {
    fn default() -> Self {
        Self {
            max_sweeps: 100,
            tolerance: 1e-12,
        }
    }
}

impl JacobiBackend {
    pub fn new(max_sweeps: usize, tolerance: f64) -> Self {
        Self { max_sweeps, tolerance }
    }
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += a[[i, j]] * a[[i, j]];
            }
        }
    }
    sum.sqrt()
}

impl BackendEig for JacobiBackend {
    fn eig(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
        let n = check_square(matrix)?;
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err("Matrix contains non-finite (NaN or infinity) values.".into());
        }

        let mut a = matrix.to_owned();
        let mut v = Array2::<f64>::eye(n);
        let total_norm = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let target = self.tolerance * total_norm;

        let mut converged = false;
        for sweep in 0..self.max_sweeps {
            let off = off_diagonal_norm(&a);
            trace!("Jacobi sweep {}: off-diagonal norm {:e}", sweep, off);
            if off <= target {
                converged = true;
                break;
            }
            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = a[[p, q]];
                    if apq == 0.0 {
                        continue;
                    }
                    let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                    // Smaller root of t^2 + 2*theta*t - 1 = 0 keeps the rotation angle below pi/4.
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;

                    for k in 0..n {
                        let akp = a[[k, p]];
                        let akq = a[[k, q]];
                        a[[k, p]] = c * akp - s * akq;
                        a[[k, q]] = s * akp + c * akq;
                    }
                    for k in 0..n {
                        let apk = a[[p, k]];
                        let aqk = a[[q, k]];
                        a[[p, k]] = c * apk - s * aqk;
                        a[[q, k]] = s * apk + c * aqk;
                    }
                    for k in 0..n {
                        let vkp = v[[k, p]];
                        let vkq = v[[k, q]];
                        v[[k, p]] = c * vkp - s * vkq;
                        v[[k, q]] = s * vkp + c * vkq;
                    }
                }
            }
        }
        if !converged {
            let off = off_diagonal_norm(&a);
            if off > target {
                warn!(
                    "Jacobi solver stopped after {} sweeps with off-diagonal norm {:e} (target {:e})",
                    self.max_sweeps, off, target
                );
                return Err(format!(
                    "Jacobi iteration did not converge within {} sweeps (off-diagonal norm {:e}).",
                    self.max_sweeps, off
                )
                .into());
            }
        }

        Ok(EigOutput {
            eigenvalues_re: a.diag().to_owned(),
            eigenvalues_im: Array1::zeros(n),
            eigenvectors: v,
        })
    }
}

// --- LAPACK Backends (ndarray-linalg) ---

#[cfg(feature = "backend_lapack")]
mod lapack_specific_code {
    use super::{check_square, BackendEig, BackendError, EigOutput};
    use ndarray::{Array1, Array2};
    use ndarray_linalg::{Eig as NdLinalgEig, Eigh as NdLinalgEigh, UPLO};
    use std::error::Error;

    fn to_dyn_error<E: Error + Send + Sync + 'static>(e: E) -> BackendError {
        Box::new(e)
    }

    /// General (non-symmetric) LAPACK solver (`geev`). Eigenvalues and
    /// eigenvectors come back complex; real and imaginary parts are split.
    #[derive(Debug, Default, Copy, Clone)]
    pub struct LapackGeneralBackend;

    impl BackendEig for LapackGeneralBackend {
        fn eig(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
            let n = check_square(matrix)?;
            if n == 0 {
                return Ok(EigOutput {
                    eigenvalues_re: Array1::zeros(0),
                    eigenvalues_im: Array1::zeros(0),
                    eigenvectors: Array2::zeros((0, 0)),
                });
            }
            let (values, vectors) = matrix.eig().map_err(to_dyn_error)?;
            Ok(EigOutput {
                eigenvalues_re: values.mapv(|z| z.re),
                eigenvalues_im: values.mapv(|z| z.im),
                eigenvectors: vectors.mapv(|z| z.re),
            })
        }
    }

    /// Symmetric LAPACK solver (`syev`), reading the upper triangle.
    #[derive(Debug, Default, Copy, Clone)]
    pub struct LapackSymmetricBackend;

    impl BackendEig for LapackSymmetricBackend {
        fn eig(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
            let n = check_square(matrix)?;
            if n == 0 {
                return Ok(EigOutput {
                    eigenvalues_re: Array1::zeros(0),
                    eigenvalues_im: Array1::zeros(0),
                    eigenvectors: Array2::zeros((0, 0)),
                });
            }
            let (eigenvalues, eigenvectors) = matrix.eigh(UPLO::Upper).map_err(to_dyn_error)?;
            Ok(EigOutput {
                eigenvalues_im: Array1::zeros(eigenvalues.len()),
                eigenvalues_re: eigenvalues,
                eigenvectors,
            })
        }
    }
}

#[cfg(feature = "backend_lapack")]
pub use lapack_specific_code::{LapackGeneralBackend, LapackSymmetricBackend};

// --- Provider Dispatch ---

/// Dispatches to the eigen-solver selected by compile-time features:
/// the LAPACK symmetric solver with `backend_lapack`, the Jacobi solver
/// otherwise.
#[derive(Debug, Default, Copy, Clone)]
pub struct EigenSolverProvider {
    #[cfg_attr(feature = "backend_lapack", allow(dead_code))]
    jacobi: JacobiBackend,
}

impl EigenSolverProvider {
    pub fn new(jacobi: JacobiBackend) -> Self {
        Self { jacobi }
    }

    pub fn backend_name(&self) -> &'static str {
        #[cfg(feature = "backend_lapack")]
        {
            "lapack-symmetric"
        }
        #[cfg(not(feature = "backend_lapack"))]
        {
            "jacobi"
        }
    }
}

impl BackendEig for EigenSolverProvider {
    fn eig(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
        #[cfg(feature = "backend_lapack")]
        {
            LapackSymmetricBackend.eig(matrix)
        }
        #[cfg(not(feature = "backend_lapack"))]
        {
            self.jacobi.eig(matrix)
        }
    }
}
