//! Error surface for the selective MLE.
//!
//! Covers malformed problem inputs, barrier-solver failures and bootstrap
//! misuse. Linear-algebra failures (a singular barrier Hessian, a target
//! covariance that is not SPD) are wrapped rather than re-described.

use crate::linalg::LinalgError;

/// Result alias for selective MLE routines.
pub type MleResult<T> = Result<T, MleError>;

#[derive(Debug, Clone, PartialEq)]
pub enum MleError {
    // ---- Options ----
    InvalidOptions {
        field: &'static str,
        reason: &'static str,
    },

    // ---- Shapes ----
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    // ---- Barrier solver ----
    /// The starting point has a coordinate that is not strictly positive.
    InfeasibleStart {
        index: usize,
        value: f64,
    },
    /// No step along the search direction kept every coordinate positive.
    NoFeasibleStep {
        iteration: usize,
    },
    /// The barrier objective became NaN or infinite.
    NonFiniteValue {
        value: f64,
    },

    // ---- Bootstrap ----
    /// Resampling needs at least one data row.
    EmptyData,

    // ---- Wrapped ----
    Linalg(LinalgError),
}

impl std::error::Error for MleError {}

impl std::fmt::Display for MleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Options ----
            MleError::InvalidOptions { field, reason } => {
                write!(f, "Invalid barrier option '{field}': {reason}")
            }

            // ---- Shapes ----
            MleError::DimensionMismatch { context, expected, found } => {
                write!(f, "Dimension mismatch in {context}: expected {expected}, found {found}")
            }

            // ---- Barrier solver ----
            MleError::InfeasibleStart { index, value } => {
                write!(f, "Barrier start must be strictly positive; coordinate {index} is {value}")
            }
            MleError::NoFeasibleStep { iteration } => {
                write!(f, "Barrier solver found no feasible step at iteration {iteration}")
            }
            MleError::NonFiniteValue { value } => {
                write!(f, "Barrier objective is not finite: {value}")
            }

            // ---- Bootstrap ----
            MleError::EmptyData => write!(f, "Bootstrap requires at least one data row"),

            // ---- Wrapped ----
            MleError::Linalg(err) => write!(f, "Selective MLE linear algebra: {err}"),
        }
    }
}

impl From<LinalgError> for MleError {
    fn from(err: LinalgError) -> Self {
        MleError::Linalg(err)
    }
}
