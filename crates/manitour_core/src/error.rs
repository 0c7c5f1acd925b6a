use thiserror::Error;

/// Failures reported by the tour pipeline.
///
/// Every check happens at the call that receives the offending input, and the
/// computation is deterministic, so retrying with the same arguments fails the
/// same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TourError {
    /// Malformed shapes, out-of-range indices, bad angle ranges, or label
    /// vectors that cannot be recycled over a table.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A matrix that should be orthonormal is not, or an orthonormalization
    /// collapsed a column to zero.
    #[error("Numerically degenerate: {0}")]
    NumericDegenerate(String),
}

pub type Result<T> = std::result::Result<T, TourError>;

macro_rules! bail_invalid {
    ($($arg:tt)*) => {
        return Err($crate::error::TourError::InvalidArgument(format!($($arg)*)))
    };
}

pub(crate) use bail_invalid;
