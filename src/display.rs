// src/display.rs

use ndarray::{ArrayView1, ArrayView2};
use std::fmt::Write;

use crate::pca::PcaRun;

/// Formats a vector as `[v0, v1, ...]` with `precision` decimals.
pub fn render_vector(values: ArrayView1<f64>, precision: usize) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:.*}", precision, v)).collect();
    format!("[{}]", items.join(", "))
}

/// One rendered vector per matrix row, newline separated.
pub fn render_matrix(matrix: ArrayView2<f64>, precision: usize) -> String {
    let mut out = String::new();
    for row in matrix.rows() {
        out.push_str(&render_vector(row, precision));
        out.push('\n');
    }
    out
}

/// Renders every stage of a run as titled blocks.
pub fn render_run(run: &PcaRun, precision: usize) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "* Subtract mean :");
    out.push_str(&render_matrix(run.centered.view(), precision));
    let _ = writeln!(out, "\n* Covariance matrix :");
    out.push_str(&render_matrix(run.covariance.view(), precision));
    let _ = writeln!(out, "\n* Eigenvalues before filtering :");
    let _ = writeln!(out, "{}", render_vector(run.decomposition.eigenvalues.view(), precision));
    let _ = writeln!(out, "\n* Eigenvectors before filtering :");
    out.push_str(&render_matrix(run.decomposition.eigenvectors.view(), precision));
    let _ = writeln!(out, "\n* Eigenvalues after filtering :");
    let _ = writeln!(out, "{}", render_vector(run.basis.eigenvalues.view(), precision));
    let _ = writeln!(out, "\n* Eigenvectors after filtering :");
    out.push_str(&render_matrix(run.basis.eigenvectors.view(), precision));
    let _ = writeln!(out, "\n* After PCA :");
    out.push_str(&render_matrix(run.projected.view(), precision));
    out
}
