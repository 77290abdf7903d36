use crate::diagnostics::total_sample_variance;
use crate::linalg_backends::{BackendError, BackendEig, EigOutput, JacobiBackend};
use crate::{PcaConfig, PcaError, PCA};

use approx::assert_abs_diff_eq;
use float_cmp::assert_approx_eq;
use ndarray::{array, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn demo_rows() -> Vec<Vec<f64>> {
    vec![
        vec![2.5, 2.4],
        vec![0.5, 0.7],
        vec![2.2, 2.9],
        vec![1.9, 2.2],
        vec![3.1, 3.0],
        vec![2.3, 2.7],
        vec![2.0, 1.6],
        vec![1.0, 1.1],
        vec![1.5, 1.6],
        vec![1.1, 0.9],
    ]
}

fn generate_random_data(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_fn((n_samples, n_features), |_| rng.gen_range(-3.0..3.0))
}

fn keep_all() -> PcaConfig {
    PcaConfig {
        eigenvalue_threshold: f64::NEG_INFINITY,
        ..PcaConfig::default()
    }
}

/// Compares two vectors that may differ by an overall sign.
fn assert_close_up_to_sign(actual: ArrayView1<f64>, expected: ArrayView1<f64>, tol: f64) {
    let sign = if actual.dot(&expected) < 0.0 { -1.0 } else { 1.0 };
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((sign * a - e).abs() < tol, "{} vs {} (sign {})", a, e, sign);
    }
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_demo_dataset_end_to_end() {
        let run = PCA::new().fit_rows(&demo_rows()).unwrap();

        // covariance: symmetric 2x2 with positive diagonal
        assert_eq!(run.covariance.dim(), (2, 2));
        assert_eq!(run.covariance[[0, 1]], run.covariance[[1, 0]]);
        assert_approx_eq!(f64, run.covariance[[0, 0]], 0.616_555_556, epsilon = 1e-8);
        assert_approx_eq!(f64, run.covariance[[1, 1]], 0.716_555_556, epsilon = 1e-8);
        assert_approx_eq!(f64, run.covariance[[0, 1]], 0.615_444_444, epsilon = 1e-8);

        // two eigenvalues, one above and one below the threshold
        assert_eq!(run.decomposition.len(), 2);
        let above = run.decomposition.eigenvalues.iter().filter(|&&v| v >= 1.0).count();
        assert_eq!(above, 1);
        let mut sorted = run.decomposition.eigenvalues.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_approx_eq!(f64, sorted[0], 1.284_027_71, epsilon = 1e-7);
        assert_approx_eq!(f64, sorted[1], 0.049_083_399, epsilon = 1e-7);

        // only the larger pair survives
        assert_eq!(run.n_components(), 1);
        assert_approx_eq!(f64, run.basis.eigenvalues[0], sorted[0], epsilon = 1e-12);
        assert_close_up_to_sign(
            run.basis.eigenvectors.row(0),
            array![0.677_873_399, 0.735_178_656].view(),
            1e-7,
        );

        // 10x1 reduced dataset
        assert_eq!(run.projected.dim(), (10, 1));
    }

    #[test]
    fn test_demo_dataset_full_basis_matches_reference_scores() {
        let expected = array![
            [-0.827970186, -0.175115307],
            [1.77758033, 0.142857227],
            [-0.992197494, 0.384374989],
            [-0.274210416, 0.130417207],
            [-1.67580142, -0.209498461],
            [-0.912949103, 0.175282444],
            [0.0991094375, -0.349824698],
            [1.14457216, 0.0464172582],
            [0.438046137, 0.0177646297],
            [1.22382056, -0.162675287]
        ];
        let run = PCA::with_config(keep_all()).unwrap().fit_rows(&demo_rows()).unwrap();
        assert_eq!(run.projected.dim(), (10, 2));
        for k in 0..2 {
            assert_close_up_to_sign(run.projected.column(k), expected.column(k), 1e-6);
        }
    }

    #[test]
    fn test_explained_variance_ratio_of_demo() {
        let run = PCA::new().fit_rows(&demo_rows()).unwrap();
        let ratio = run.explained_variance_ratio();
        assert_eq!(ratio.len(), 1);
        assert_abs_diff_eq!(ratio[0], 1.284_027_71 / (0.616_555_556 + 0.716_555_556), epsilon = 1e-6);
    }

    #[test]
    fn test_transform_of_training_data_reproduces_projection() {
        let run = PCA::new().fit_rows(&demo_rows()).unwrap();
        let again = run.transform_rows(&demo_rows()).unwrap();
        for (a, b) in again.iter().zip(run.projected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        let err = run.transform(Array2::<f64>::zeros((3, 5)).view()).unwrap_err();
        assert!(err.is_shape_mismatch());
        assert_eq!(run.transform(Array2::<f64>::zeros((0, 2)).view()).unwrap().dim(), (0, 1));
    }
}

mod property_tests {
    use super::*;

    #[test]
    fn test_centered_columns_have_zero_mean() {
        for seed in 0..5 {
            let data = generate_random_data(15, 4, seed) + 10.0;
            let run = PCA::new().fit(data.view()).unwrap();
            let means = run.centered.mean_axis(Axis(0)).unwrap();
            for m in means.iter() {
                assert_abs_diff_eq!(*m, 0.0, epsilon = 1e-12);
            }
            assert!(run.diagnostics.centered_max_abs_column_mean < 1e-12);
        }
    }

    #[test]
    fn test_covariance_is_symmetric() {
        let data = generate_random_data(20, 6, 11);
        let run = PCA::new().fit(data.view()).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                assert_eq!(run.covariance[[i, j]], run.covariance[[j, i]]);
            }
        }
        assert_eq!(run.diagnostics.covariance_max_asymmetry, 0.0);
    }

    #[test]
    fn test_eigenpairs_satisfy_eigen_equation() {
        let data = generate_random_data(25, 5, 3);
        let run = PCA::new().fit(data.view()).unwrap();
        assert_eq!(run.decomposition.max_discarded_imaginary, 0.0);
        for (lambda, v) in run.decomposition.pairs() {
            let mv = run.covariance.dot(&v);
            for i in 0..5 {
                assert_abs_diff_eq!(mv[i], lambda * v[i], epsilon = 1e-9);
            }
        }
        assert!(run.diagnostics.max_eigen_residual < 1e-9);
        assert!(run.diagnostics.eigenvector_orthogonality_error.unwrap() < 1e-9);
    }

    #[test]
    fn test_selected_eigenvalues_sorted_and_above_threshold() {
        let data = generate_random_data(40, 8, 21) * 2.0;
        let run = PCA::new().fit(data.view()).unwrap();
        let values = &run.basis.eigenvalues;
        assert!(values.iter().all(|&v| v >= 1.0));
        for w in values.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert_eq!(run.projected.ncols(), values.len());
    }

    #[test]
    fn test_full_basis_projection_preserves_total_variance() {
        for seed in [1_u64, 2, 3] {
            let data = generate_random_data(30, 4, seed);
            let run = PCA::with_config(keep_all()).unwrap().fit(data.view()).unwrap();
            assert_eq!(run.projected.ncols(), 4);
            let projected_variance = total_sample_variance(&run.projected.view());
            assert_abs_diff_eq!(projected_variance, run.diagnostics.total_variance, epsilon = 1e-9);
            let ratio_sum: f64 = run.explained_variance_ratio().sum();
            assert_abs_diff_eq!(ratio_sum, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_parallel_covariance_gives_identical_run() {
        let data = generate_random_data(50, 7, 99);
        let sequential = PCA::new().fit(data.view()).unwrap();
        let config = PcaConfig {
            parallel_covariance: true,
            ..PcaConfig::default()
        };
        let parallel = PCA::with_config(config).unwrap().fit(data.view()).unwrap();
        assert_eq!(sequential, parallel);
    }
}

mod boundary_tests {
    use super::*;

    struct BrokenSolver;

    impl BackendEig for BrokenSolver {
        fn eig(&self, _matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
            Err("LAPACK error: info = 3".into())
        }
    }

    #[test]
    fn test_two_rows_is_enough() {
        let rows = vec![vec![1.0, 5.0, -2.0], vec![3.0, 1.0, 2.0]];
        let run = PCA::new().fit_rows(&rows).unwrap();
        // denominator n - 1 = 1
        assert_abs_diff_eq!(run.covariance[[0, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(run.covariance[[1, 1]], 8.0, epsilon = 1e-12);
        assert!(run.covariance.iter().all(|v| v.is_finite()));
        assert_eq!(run.projected.nrows(), 2);
    }

    #[test]
    fn test_single_row_is_invalid_input() {
        let err = PCA::new().fit_rows(&[vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, PcaError::InvalidInput(_)), "{err}");
    }

    #[test]
    fn test_no_rows_is_invalid_input() {
        let err = PCA::new().fit_rows(&[]).unwrap_err();
        assert!(err.is_invalid_input());
        let err = PCA::new().fit(Array2::<f64>::zeros((0, 2)).view()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_ragged_rows_are_shape_mismatch() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0]];
        let err = PCA::new().fit_rows(&rows).unwrap_err();
        assert!(matches!(err, PcaError::ShapeMismatch(_)), "{err}");
    }

    #[test]
    fn test_empty_retained_basis() {
        let config = PcaConfig {
            eigenvalue_threshold: 1e6,
            ..PcaConfig::default()
        };
        let run = PCA::with_config(config).unwrap().fit_rows(&demo_rows()).unwrap();
        assert_eq!(run.n_components(), 0);
        assert_eq!(run.projected.dim(), (10, 0));
        assert_eq!(run.explained_variance_ratio().len(), 0);
    }

    #[test]
    fn test_constant_data_has_zero_variance() {
        let rows = vec![vec![4.0, 4.0]; 5];
        let run = PCA::new().fit_rows(&rows).unwrap();
        assert!(run.covariance.iter().all(|&v| v == 0.0));
        assert_eq!(run.n_components(), 0);
        assert_eq!(run.diagnostics.total_variance, 0.0);
    }

    #[test]
    fn test_solver_failure_surfaces_as_decomposition_failed() {
        use std::error::Error;
        let pca = PCA::with_backend(PcaConfig::default(), BrokenSolver).unwrap();
        let err = pca.fit_rows(&demo_rows()).unwrap_err();
        assert!(err.is_decomposition_failed(), "{err}");
        assert!(err.source().unwrap().to_string().contains("info = 3"));
    }

    #[test]
    fn test_non_converging_jacobi_surfaces_as_decomposition_failed() {
        let pca = PCA::with_backend(PcaConfig::default(), JacobiBackend::new(0, 1e-12)).unwrap();
        let err = pca.fit_rows(&demo_rows()).unwrap_err();
        assert!(err.is_decomposition_failed(), "{err}");
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_default_threshold_is_one() {
        assert_eq!(PcaConfig::default().eigenvalue_threshold, 1.0);
        assert_eq!(PCA::new().config().eigenvalue_threshold, 1.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PcaConfig::from_json_str(r#"{ "eigenvalue_threshold": 0.5, "parallel_covariance": true }"#).unwrap();
        assert_eq!(config.eigenvalue_threshold, 0.5);
        assert!(config.parallel_covariance);
        assert_eq!(config.jacobi_max_sweeps, PcaConfig::default().jacobi_max_sweeps);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad = PcaConfig {
            symmetry_tolerance: -1.0,
            ..PcaConfig::default()
        };
        assert!(PCA::with_config(bad).unwrap_err().is_invalid_input());
        let nan = PcaConfig {
            eigenvalue_threshold: f64::NAN,
            ..PcaConfig::default()
        };
        assert!(nan.validate().is_err());
        assert!(PcaConfig::from_json_str("{ not json").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pca.json");
        let config = PcaConfig {
            eigenvalue_threshold: 0.25,
            jacobi_max_sweeps: 7,
            ..PcaConfig::default()
        };
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(PcaConfig::from_json_file(&path).unwrap(), config);
    }
}
