// Principal component analysis (PCA)

#![doc = include_str!("../README.md")]

pub mod centering;
pub mod covariance;
pub mod diagnostics;
pub mod display;
pub mod eigen;
pub mod error;
pub mod linalg_backends;
pub mod pca;
pub mod projection;
pub mod selection;

#[cfg(test)]
mod pca_tests;

pub use centering::{column_means, subtract_mean, subtract_mean_rows, to_matrix};
pub use covariance::{covariance, covariance_matrix};
pub use eigen::{decompose, EigenDecomposition, EigenTolerances};
pub use error::PcaError;
pub use linalg_backends::{BackendEig, EigOutput, EigenSolverProvider, JacobiBackend};
pub use pca::{PcaConfig, PcaRun, PCA};
pub use projection::{project, project_onto_basis};
pub use selection::{select_components, RetainedBasis, DEFAULT_EIGENVALUE_THRESHOLD};
