//! Manipulation space construction and rotation.
//!
//! The manipulation space augments a (p, d) basis with the direction of one
//! variable, orthonormalized against the basis. Rotating this (p, d+1) frame
//! changes how much of the variable's contribution lies in the visible
//! projection (phi) and along which in-plane direction it moves (theta).

use crate::basis::{Basis, ManipVar};
use crate::error::{bail_invalid, Result, TourError};
use crate::orthonormal::orthonormalize;
use log::debug;
use nalgebra::{DMatrix, DVector, Matrix3};
use serde::{Deserialize, Serialize};

/// An orthonormal (p, d+1) rotation workspace.
///
/// The first d columns span the original projection plane and the last one
/// carries the part of the manipulation variable orthogonal to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipSpace {
    matrix: DMatrix<f64>,
    labels: Option<Vec<String>>,
    manip_row: usize,
}

impl ManipSpace {
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// 0-based row of the manipulation variable.
    pub fn manip_row(&self) -> usize {
        self.manip_row
    }

    /// Projection dimension of the basis this space was built from.
    pub fn projection_dim(&self) -> usize {
        self.matrix.ncols() - 1
    }

    /// Rotates the space by `theta` in-plane and `phi` out-of-plane.
    ///
    /// Only defined for spaces built from 2D bases.
    pub fn rotate(&self, theta: f64, phi: f64) -> Result<ManipSpace> {
        Ok(ManipSpace {
            matrix: rotate_matrix(&self.matrix, theta, phi)?,
            labels: self.labels.clone(),
            manip_row: self.manip_row,
        })
    }

    /// First `projection_dim` columns: the visible projection basis.
    pub fn projection(&self) -> DMatrix<f64> {
        self.matrix.columns(0, self.projection_dim()).into_owned()
    }
}

/// Builds the manipulation space for `manip_var` from `basis`.
///
/// Row labels carry over from the basis. When the variable already lies
/// entirely in the projection plane the augmented column vanishes under
/// Gram-Schmidt, and the space is completed with the unit axis farthest from
/// the plane instead.
pub fn create_manip_space(basis: &Basis, manip_var: &ManipVar) -> Result<ManipSpace> {
    let manip_row = basis.resolve_manip_var(manip_var)?;
    let p = basis.nrows();
    let d = basis.ncols();
    if d + 1 > p {
        bail_invalid!(
            "A {}x{} basis leaves no room for a manipulation axis.",
            p,
            d
        );
    }

    let mut augmented = basis.matrix().clone().insert_column(d, 0.0);
    augmented[(manip_row, d)] = 1.0;

    let matrix = match orthonormalize(&augmented) {
        Ok(matrix) => matrix,
        Err(TourError::NumericDegenerate(_)) => {
            debug!(
                "manip_var {} lies in the projection plane, completing with an orthogonal axis",
                manip_row + 1
            );
            complete_basis(&orthonormalize(basis.matrix())?)?
        }
        Err(err) => return Err(err),
    };

    Ok(ManipSpace {
        matrix,
        labels: basis.labels().map(|labels| labels.to_vec()),
        manip_row,
    })
}

/// Appends the unit axis with the largest component orthogonal to `ortho`.
fn complete_basis(ortho: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (p, d) = ortho.shape();
    let mut best: Option<(f64, DVector<f64>)> = None;
    for j in 0..p {
        let mut axis = DVector::zeros(p);
        axis[j] = 1.0;
        for i in 0..d {
            let dot = axis.dot(&ortho.column(i));
            axis.axpy(-dot, &ortho.column(i), 1.0);
        }
        let norm = axis.norm();
        if best.as_ref().map_or(true, |(best_norm, _)| norm > *best_norm) {
            best = Some((norm, axis));
        }
    }

    match best {
        Some((norm, axis)) if norm > 1e-10 => {
            let mut completed = ortho.clone().insert_column(d, 0.0);
            completed.set_column(d, &(axis / norm));
            Ok(completed)
        }
        _ => Err(TourError::NumericDegenerate(
            "No direction orthogonal to the basis remains.".to_string(),
        )),
    }
}

/// The 3x3 rotation that turns the in-plane direction `theta` by the
/// out-of-plane angle `phi`.
///
/// `phi = 0` gives the identity for every `theta`.
pub fn rotation_matrix(theta: f64, phi: f64) -> Matrix3<f64> {
    let (s_theta, c_theta) = theta.sin_cos();
    let (s_phi, c_phi) = phi.sin_cos();
    let cross = -s_theta * c_theta * (1.0 - c_phi);

    Matrix3::new(
        c_theta * c_theta * c_phi + s_theta * s_theta,
        cross,
        -c_theta * s_phi,
        cross,
        s_theta * s_theta * c_phi + c_theta * c_theta,
        -s_theta * s_phi,
        c_theta * s_phi,
        s_theta * s_phi,
        c_phi,
    )
}

/// Right-multiplies a raw (p, 3) manipulation space by [`rotation_matrix`].
pub fn rotate_matrix(space: &DMatrix<f64>, theta: f64, phi: f64) -> Result<DMatrix<f64>> {
    if space.ncols() != 3 {
        bail_invalid!(
            "Manipulation space must have exactly 3 columns, got {}.",
            space.ncols()
        );
    }
    if !theta.is_finite() || !phi.is_finite() {
        bail_invalid!("Rotation angles must be finite (theta = {}, phi = {}).", theta, phi);
    }
    let rotation = rotation_matrix(theta, phi);
    Ok(space * DMatrix::from_column_slice(3, 3, rotation.as_slice()))
}
