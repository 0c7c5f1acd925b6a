//! Gram-Schmidt orthonormalization and the orthonormality check used to
//! validate incoming bases.

use crate::error::{Result, TourError};
use nalgebra::DMatrix;

/// Tolerance used when callers do not supply one.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

const COLUMN_EPS: f64 = 1e-10;

/// Returns the (p, k) matrix with orthonormal columns closest to `matrix`
/// under classical Gram-Schmidt: each column is normalised, then every later
/// column has its projection onto the earlier ones removed.
///
/// Columns that are already orthonormal come back unchanged (up to rounding),
/// so an orthonormal basis augmented with extra columns keeps its leading
/// columns.
pub fn orthonormalize(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(TourError::InvalidArgument(
            "Cannot orthonormalize an empty matrix.".to_string(),
        ));
    }
    if matrix.ncols() > matrix.nrows() {
        return Err(TourError::InvalidArgument(format!(
            "Cannot orthonormalize {} columns in {} dimensions.",
            matrix.ncols(),
            matrix.nrows()
        )));
    }

    let mut out = matrix.clone();
    for j in 0..out.ncols() {
        for i in 0..j {
            let dot = out.column(j).dot(&out.column(i));
            let prev = out.column(i).into_owned();
            out.column_mut(j).axpy(-dot, &prev, 1.0);
        }
        let norm = out.column(j).norm();
        if !norm.is_finite() || norm <= COLUMN_EPS {
            return Err(TourError::NumericDegenerate(format!(
                "Column {} is linearly dependent on the previous columns.",
                j + 1
            )));
        }
        out.column_mut(j).unscale_mut(norm);
    }
    Ok(out)
}

/// Largest absolute element of `MᵗM - I`.
pub fn orthonormality_error(matrix: &DMatrix<f64>) -> f64 {
    let gram = matrix.transpose() * matrix;
    let identity = DMatrix::<f64>::identity(gram.nrows(), gram.ncols());
    (gram - identity).amax()
}

/// Whether `matrix` is finite with `MᵗM` within `tolerance` of the identity.
pub fn is_orthonormal(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    matrix.iter().all(|v| v.is_finite()) && orthonormality_error(matrix) < tolerance
}
