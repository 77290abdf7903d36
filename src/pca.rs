// Principal component analysis (PCA) pipeline

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::centering::{column_means, to_matrix};
use crate::covariance::covariance_matrix;
use crate::diagnostics::{
    compute_orthogonality_error_f64, max_abs_column_mean, max_asymmetry, max_eigen_residual, trace,
    RunDiagnostics,
};
use crate::eigen::{decompose, EigenDecomposition, EigenTolerances};
use crate::error::PcaError;
use crate::linalg_backends::{BackendEig, EigenSolverProvider, JacobiBackend};
use crate::projection::project_onto_basis;
use crate::selection::{RetainedBasis, DEFAULT_EIGENVALUE_THRESHOLD};

/// Tunable parameters of a PCA run.
///
/// Every field has a default, so a partial JSON document is enough to
/// override a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaConfig {
    /// Components with an eigenvalue below this are dropped. Defaults to 1.0.
    pub eigenvalue_threshold: f64,
    /// Imaginary eigenvalue parts up to this magnitude are dropped silently.
    pub imaginary_tolerance: f64,
    /// Asymmetry of the covariance matrix tolerated without a warning.
    pub symmetry_tolerance: f64,
    /// Compute covariance entries on the rayon thread pool.
    pub parallel_covariance: bool,
    /// Sweep limit for the Jacobi eigen-solver.
    pub jacobi_max_sweeps: usize,
    /// Relative off-diagonal norm at which the Jacobi solver stops.
    pub jacobi_tolerance: f64,
}

impl Default for PcaConfig {
    fn default() -> Self {
        PcaConfig {
            eigenvalue_threshold: DEFAULT_EIGENVALUE_THRESHOLD,
            imaginary_tolerance: 1e-9,
            symmetry_tolerance: 1e-9,
            parallel_covariance: false,
            jacobi_max_sweeps: 100,
            jacobi_tolerance: 1e-12,
        }
    }
}

impl PcaConfig {
    /// Checks that every tolerance is finite and non-negative and that the
    /// threshold is a number (negative infinity keeps every component).
    pub fn validate(&self) -> Result<(), PcaError> {
        if self.eigenvalue_threshold.is_nan() {
            return Err(PcaError::invalid_input("eigenvalue_threshold must not be NaN"));
        }
        for (name, value) in [
            ("imaginary_tolerance", self.imaginary_tolerance),
            ("symmetry_tolerance", self.symmetry_tolerance),
            ("jacobi_tolerance", self.jacobi_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PcaError::invalid_input(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PcaError> {
        let config: PcaConfig = serde_json::from_str(json)
            .map_err(|e| PcaError::invalid_input(format!("invalid PCA config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PcaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PcaError::invalid_input(format!("cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn eigen_tolerances(&self) -> EigenTolerances {
        EigenTolerances {
            symmetry: self.symmetry_tolerance,
            imaginary: self.imaginary_tolerance,
        }
    }

    pub fn jacobi_backend(&self) -> JacobiBackend {
        JacobiBackend::new(self.jacobi_max_sweeps, self.jacobi_tolerance)
    }
}

/// Principal component analysis driver.
///
/// Runs centering, covariance estimation, eigen-decomposition, component
/// selection and projection in that order. Each call to [`PCA::fit`]
/// produces an independent [`PcaRun`] holding every stage's output; the
/// driver itself keeps no state between calls.
///
/// # Examples
///
/// ```
/// use stepwise_pca::PCA;
///
/// let rows = vec![vec![2.5, 2.4], vec![0.5, 0.7], vec![2.2, 2.9], vec![1.9, 2.2]];
/// let run = PCA::new().fit_rows(&rows).unwrap();
/// assert_eq!(run.projected.nrows(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PCA<B = EigenSolverProvider> {
    config: PcaConfig,
    backend: B,
}

impl Default for PCA {
    fn default() -> Self {
        Self::new()
    }
}

impl PCA {
    /// Creates a PCA driver with the default configuration and the
    /// feature-selected eigen-solver.
    pub fn new() -> Self {
        let config = PcaConfig::default();
        let backend = EigenSolverProvider::new(config.jacobi_backend());
        Self { config, backend }
    }

    /// Creates a PCA driver with the feature-selected eigen-solver.
    ///
    /// # Errors
    /// `InvalidInput` if the configuration does not validate.
    pub fn with_config(config: PcaConfig) -> Result<Self, PcaError> {
        let backend = EigenSolverProvider::new(config.jacobi_backend());
        Self::with_backend(config, backend)
    }
}

impl<B: BackendEig> PCA<B> {
    /// Creates a PCA driver using a caller-supplied eigen-solver.
    pub fn with_backend(config: PcaConfig, backend: B) -> Result<Self, PcaError> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &PcaConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Validates raw rows (equal, non-zero length) and runs the pipeline.
    pub fn fit_rows(&self, rows: &[Vec<f64>]) -> Result<PcaRun, PcaError> {
        let data = to_matrix(rows)?;
        self.fit(data.view())
    }

    /// Runs the full pipeline on a data matrix of shape (n_samples, n_features).
    ///
    /// # Errors
    /// Any stage error is returned unchanged: `InvalidInput` for fewer than
    /// two samples or zero features, `DecompositionFailed` if the solver fails.
    pub fn fit(&self, data: ArrayView2<f64>) -> Result<PcaRun, PcaError> {
        let (n_samples, n_features) = data.dim();
        if n_features == 0 {
            return Err(PcaError::invalid_input("data matrix has zero features"));
        }

        let means = column_means(data)?;
        let centered = &data - &means;
        debug!("Stage 1/5: centered {}x{} data", n_samples, n_features);

        let covariance = covariance_matrix(centered.view(), self.config.parallel_covariance)?;
        debug!("Stage 2/5: covariance matrix {:?}", covariance);

        let decomposition = decompose(&covariance, &self.backend, self.config.eigen_tolerances())?;
        debug!("Stage 3/5: eigenvalues {:?}", decomposition.eigenvalues);

        let basis = RetainedBasis::from_decomposition(&decomposition, self.config.eigenvalue_threshold)?;
        debug!("Stage 4/5: retained eigenvalues {:?}", basis.eigenvalues);

        let projected = project_onto_basis(centered.view(), &basis)?;
        debug!("Stage 5/5: projected data is {}x{}", projected.nrows(), projected.ncols());

        let diagnostics = RunDiagnostics {
            n_samples,
            n_features,
            n_retained: basis.len(),
            centered_max_abs_column_mean: max_abs_column_mean(&centered.view()),
            covariance_max_asymmetry: max_asymmetry(&covariance.view()),
            max_eigen_residual: max_eigen_residual(&covariance.view(), &decomposition),
            eigenvector_orthogonality_error: compute_orthogonality_error_f64(&decomposition.eigenvectors.view()),
            max_discarded_imaginary: decomposition.max_discarded_imaginary,
            total_variance: trace(&covariance.view()),
        };
        info!(
            "PCA on {}x{} data retained {} of {} components (threshold {}, total variance {:.6})",
            n_samples,
            n_features,
            basis.len(),
            decomposition.len(),
            self.config.eigenvalue_threshold,
            diagnostics.total_variance
        );

        Ok(PcaRun {
            means,
            centered,
            covariance,
            decomposition,
            basis,
            projected,
            diagnostics,
        })
    }
}

/// The outputs of every stage of one PCA run.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaRun {
    /// Column means of the input, shape (p).
    pub means: Array1<f64>,
    /// Mean-centered input, shape (n, p).
    pub centered: Array2<f64>,
    /// Sample covariance matrix, shape (p, p).
    pub covariance: Array2<f64>,
    /// All eigen-pairs in solver order, before filtering.
    pub decomposition: EigenDecomposition,
    /// Retained eigen-pairs, largest eigenvalue first.
    pub basis: RetainedBasis,
    /// Centered data projected onto the retained basis, shape (n, m).
    pub projected: Array2<f64>,
    pub diagnostics: RunDiagnostics,
}

impl PcaRun {
    /// Number of retained components.
    pub fn n_components(&self) -> usize {
        self.basis.len()
    }

    /// Share of the total variance (covariance trace) carried by each
    /// retained component. All zeros when the data has no variance.
    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        let total = self.diagnostics.total_variance;
        if total <= 0.0 {
            return Array1::zeros(self.basis.len());
        }
        self.basis.eigenvalues.mapv(|v| v / total)
    }

    /// Centers new observations with this run's means and projects them
    /// onto the retained basis.
    ///
    /// # Errors
    /// `ShapeMismatch` if `data` does not have `p` columns.
    pub fn transform(&self, data: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
        if data.ncols() != self.means.len() {
            return Err(PcaError::shape_mismatch(format!(
                "input has {} features, model was fitted on {}",
                data.ncols(),
                self.means.len()
            )));
        }
        if data.nrows() == 0 {
            return Ok(Array2::zeros((0, self.basis.len())));
        }
        let centered = &data - &self.means;
        project_onto_basis(centered.view(), &self.basis)
    }

    /// Like [`PcaRun::transform`], for raw rows.
    pub fn transform_rows(&self, rows: &[Vec<f64>]) -> Result<Array2<f64>, PcaError> {
        let data = to_matrix(rows)?;
        self.transform(data.view())
    }
}
