//! Unified error handling for selective inference on targets.
//!
//! `InferenceError` covers malformed targets, unusable levels and
//! directions, root-finding failures from argmin, and wrapped sampler and
//! linear-algebra errors. The alias `InferenceResult<T>` standardizes the
//! return type across pivot, p-value and interval code.

use argmin::core::Error;

use crate::{linalg::LinalgError, sampling::errors::SamplerError};

/// Unified error type for target inference.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Target shape ----
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    // ---- Inputs ----
    /// Confidence level must lie in (0, 1).
    InvalidLevel {
        level: f64,
    },
    /// Linear functional with zero variance under the target covariance.
    DegenerateDirection {
        variance: f64,
    },
    /// No optimization draws were supplied.
    EmptySample,
    /// Every importance weight vanished or was non-finite.
    DegenerateWeights,

    // ---- Root finding ----
    /// Failure reported by the argmin root finder.
    RootFinding(String),

    // ---- Wrapped ----
    Sampler(SamplerError),
    Linalg(LinalgError),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Target shape ----
            InferenceError::DimensionMismatch { context, expected, found } => write!(
                f,
                "Inference Error: {context} has dimension {found}, expected {expected}"
            ),

            // ---- Inputs ----
            InferenceError::InvalidLevel { level } => {
                write!(f, "Inference Error: level {level} must lie in (0, 1)")
            }
            InferenceError::DegenerateDirection { variance } => {
                write!(f, "Inference Error: linear functional has variance {variance}")
            }
            InferenceError::EmptySample => write!(f, "Inference Error: empty optimization sample"),
            InferenceError::DegenerateWeights => {
                write!(f, "Inference Error: importance weights are degenerate")
            }

            // ---- Root finding ----
            InferenceError::RootFinding(msg) => write!(f, "Inference Error: {msg}"),

            // ---- Wrapped ----
            InferenceError::Sampler(err) => write!(f, "Inference Error: {err}"),
            InferenceError::Linalg(err) => write!(f, "Inference Error: {err}"),
        }
    }
}

impl From<Error> for InferenceError {
    fn from(err: Error) -> Self {
        match err.downcast::<InferenceError>() {
            Ok(inner) => inner,
            Err(err) => InferenceError::RootFinding(err.to_string()),
        }
    }
}

impl From<SamplerError> for InferenceError {
    fn from(err: SamplerError) -> Self {
        InferenceError::Sampler(err)
    }
}

impl From<LinalgError> for InferenceError {
    fn from(err: LinalgError) -> Self {
        InferenceError::Linalg(err)
    }
}
