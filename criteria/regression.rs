//! # Ordinary Least Squares Line Fit
//!
//! Fits `y ~ a*x + b` for one (group, band) cell. The solve goes through an
//! SVD-based least-squares routine rather than an explicit normal-equation
//! inverse, which keeps ill-conditioned cells (nearly constant B vectors)
//! well behaved. Every point carries equal weight; there is no outlier
//! rejection.

use ndarray::{Array2, ArrayView1};
use ndarray_linalg::LeastSquaresSvd;
use thiserror::Error;

/// A comprehensive error type for regression fitting failures.
#[derive(Error, Debug)]
pub enum RegressionError {
    #[error("regression inputs differ in length: {x_len} x values vs {y_len} y values")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("a line fit needs at least {required} points, but only {found} were supplied")]
    UnderDetermined { found: usize, required: usize },

    #[error("the least-squares solve failed: {0}")]
    SolveFailed(#[from] ndarray_linalg::error::LinalgError),
}

/// Fits the line `y ~ a*x + b` by ordinary least squares and returns `(a, b)`.
///
/// Requires `x.len() == y.len() >= 2`; fewer points leave the slope
/// under-determined and are rejected.
pub fn fit(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<(f64, f64), RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(RegressionError::UnderDetermined {
            found: x.len(),
            required: 2,
        });
    }

    // Design matrix [x | 1], the slope column first so that the solution
    // vector reads (a, b).
    let mut design = Array2::<f64>::ones((x.len(), 2));
    design.column_mut(0).assign(&x);

    let rhs = y.to_owned();
    let solved = design.least_squares(&rhs)?;
    Ok((solved.solution[0], solved.solution[1]))
}
