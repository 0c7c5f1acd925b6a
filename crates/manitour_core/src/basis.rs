use crate::error::{bail_invalid, Result, TourError};
use crate::orthonormal::{is_orthonormal, orthonormality_error, DEFAULT_TOLERANCE};
use log::warn;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// A (p, d) projection basis with orthonormal columns and optional variable
/// labels, one per row.
///
/// Shape problems are rejected at construction. Orthonormality is only
/// diagnosed: a basis outside [`DEFAULT_TOLERANCE`] is logged and accepted, and
/// callers that need the guarantee use [`Basis::ensure_orthonormal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    matrix: DMatrix<f64>,
    labels: Option<Vec<String>>,
}

/// Identifies the variable whose contribution is manipulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManipVar {
    /// 1-based row index into the basis.
    Index(usize),
    /// Row label of the basis.
    Name(String),
}

impl From<usize> for ManipVar {
    fn from(value: usize) -> Self {
        ManipVar::Index(value)
    }
}

impl From<&str> for ManipVar {
    fn from(value: &str) -> Self {
        ManipVar::Name(value.to_string())
    }
}

impl From<String> for ManipVar {
    fn from(value: String) -> Self {
        ManipVar::Name(value)
    }
}

impl Basis {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        Self::build(matrix, None)
    }

    pub fn with_labels(matrix: DMatrix<f64>, labels: Vec<String>) -> Result<Self> {
        Self::build(matrix, Some(labels))
    }

    /// Builds a basis from `p * d` values laid out row by row.
    pub fn from_row_slice(p: usize, d: usize, values: &[f64]) -> Result<Self> {
        let expected = match p.checked_mul(d) {
            Some(expected) => expected,
            None => bail_invalid!("A {}x{} basis is too large.", p, d),
        };
        if values.len() != expected {
            bail_invalid!(
                "Basis data has {} values, expected {} for a {}x{} basis.",
                values.len(),
                expected,
                p,
                d
            );
        }
        Self::new(DMatrix::from_row_slice(p, d, values))
    }

    /// The first `d` unit vectors of p-space.
    pub fn identity(p: usize, d: usize) -> Result<Self> {
        if d > p {
            bail_invalid!("Cannot build a {}x{} identity basis.", p, d);
        }
        Self::new(DMatrix::identity(p, d))
    }

    fn build(matrix: DMatrix<f64>, labels: Option<Vec<String>>) -> Result<Self> {
        if matrix.nrows() == 0 || matrix.ncols() == 0 {
            bail_invalid!(
                "Basis must have at least one row and column, got {}x{}.",
                matrix.nrows(),
                matrix.ncols()
            );
        }
        if matrix.ncols() > matrix.nrows() {
            bail_invalid!(
                "Basis has more columns ({}) than rows ({}).",
                matrix.ncols(),
                matrix.nrows()
            );
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            bail_invalid!("Basis entries must be finite.");
        }
        if let Some(labels) = &labels {
            if labels.len() != matrix.nrows() {
                bail_invalid!(
                    "Basis has {} rows but {} labels.",
                    matrix.nrows(),
                    labels.len()
                );
            }
        }

        if !is_orthonormal(&matrix, DEFAULT_TOLERANCE) {
            warn!(
                "Basis is not orthonormal (max |tᵗt - I| = {:.3e}, tolerance {:.0e}).",
                orthonormality_error(&matrix),
                DEFAULT_TOLERANCE
            );
        }

        Ok(Self { matrix, labels })
    }

    pub fn ensure_orthonormal(&self, tolerance: f64) -> Result<()> {
        if is_orthonormal(&self.matrix, tolerance) {
            return Ok(());
        }
        Err(TourError::NumericDegenerate(format!(
            "Basis is not orthonormal within {:e} (max |tᵗt - I| = {:.3e}).",
            tolerance,
            orthonormality_error(&self.matrix)
        )))
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Number of original variables, p.
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Projection dimension, d.
    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Resolves `manip_var` to a 0-based row index.
    pub fn resolve_manip_var(&self, manip_var: &ManipVar) -> Result<usize> {
        let p = self.nrows();
        match manip_var {
            ManipVar::Index(index) => {
                if *index == 0 || *index > p {
                    bail_invalid!("manip_var {} is out of range [1, {}].", index, p);
                }
                Ok(index - 1)
            }
            ManipVar::Name(name) => {
                let labels = match &self.labels {
                    Some(labels) => labels,
                    None => bail_invalid!(
                        "manip_var \"{}\" given by name but the basis has no labels.",
                        name
                    ),
                };
                match labels.iter().position(|label| label == name) {
                    Some(row) => Ok(row),
                    None => bail_invalid!("manip_var \"{}\" does not match any variable.", name),
                }
            }
        }
    }
}

/// 1-based index of the variable with the largest contribution to the basis.
///
/// Ties go to the earliest row.
pub fn manip_var_of(basis: &Basis) -> usize {
    let matrix = basis.matrix();
    let mut best = 0;
    let mut best_norm = f64::NEG_INFINITY;
    for (i, row) in matrix.row_iter().enumerate() {
        let norm = row.norm();
        if norm > best_norm {
            best = i;
            best_norm = norm;
        }
    }
    best + 1
}
