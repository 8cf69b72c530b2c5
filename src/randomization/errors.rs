//! Error surface for randomizer construction.

use crate::linalg::LinalgError;

/// Result alias for randomizer construction.
pub type RandomizerResult<T> = Result<T, RandomizerError>;

/// RandomizerError — invalid randomizer configurations.
///
/// Variants
/// --------
/// - `InvalidScale`
///   Scale parameter is non-finite or not strictly positive.
/// - `ZeroDimension`
///   A randomizer must perturb at least one coordinate.
/// - `Linalg`
///   The supplied covariance could not be factorized.
#[derive(Debug, Clone, PartialEq)]
pub enum RandomizerError {
    InvalidScale { scale: f64, reason: &'static str },
    ZeroDimension,
    Linalg(LinalgError),
}

impl std::error::Error for RandomizerError {}

impl std::fmt::Display for RandomizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RandomizerError::InvalidScale { scale, reason } => {
                write!(f, "Invalid randomizer scale {scale}: {reason}")
            }
            RandomizerError::ZeroDimension => {
                write!(f, "Randomizer dimension must be at least one")
            }
            RandomizerError::Linalg(err) => write!(f, "Randomizer covariance: {err}"),
        }
    }
}

impl From<LinalgError> for RandomizerError {
    fn from(err: LinalgError) -> Self {
        RandomizerError::Linalg(err)
    }
}
