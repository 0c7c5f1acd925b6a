//! The `manitour_core` crate computes manual tours: sequences of 2D projections
//! in which one variable's contribution is rotated into and out of view.
//!
//! Key components:
//! - **Basis**: validated (p, d) projection matrices and manipulation variable resolution.
//! - **Manipulation space**: the orthonormal (p, 3) workspace and its theta/phi rotation.
//! - **Tour**: path generation under a fixed frame count or a fixed angle step.
//! - **Frames**: long basis/data tables for a renderer, plus axis placement.

pub mod axes;
pub mod basis;
pub mod error;
pub mod frames;
pub mod manip_space;
pub mod orthonormal;
pub mod tour;

pub use axes::{position_axes, AxesPosition};
pub use basis::{manip_var_of, Basis, ManipVar};
pub use error::{Result, TourError};
pub use frames::{flatten, flatten_basis, BasisRow, DataRow, FlattenOptions, FrameTables};
pub use manip_space::{create_manip_space, rotate_matrix, rotation_matrix, ManipSpace};
pub use orthonormal::{is_orthonormal, orthonormalize, DEFAULT_TOLERANCE};
pub use tour::{
    manual_tour, AnglePolicy, FixedAngleStep, FixedFrameCount, ManipType, PathPolicy,
    TourPath, TourSettings,
};
