//! Error surface for the conditional sampler.

use crate::{linalg::LinalgError, selection::errors::SelectionError};

/// Result alias for sampler operations.
pub type SamplerResult<T> = Result<T, SamplerError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SamplerError {
    // ---- Options ----
    /// A sampler option is out of range.
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

    // ---- Chain ----
    /// The step size was halved below its floor without producing a finite
    /// proposal.
    StepSizeCollapsed {
        step: f64,
    },

    // ---- Wrapped ----
    Selection(SelectionError),
    Linalg(LinalgError),
}

impl std::error::Error for SamplerError {}

impl std::fmt::Display for SamplerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplerError::InvalidOptions { field, reason } => {
                write!(f, "Invalid sampler option '{field}': {reason}")
            }
            SamplerError::DimensionMismatch { context, expected, found } => {
                write!(f, "Dimension mismatch in {context}: expected {expected}, found {found}")
            }
            SamplerError::StepSizeCollapsed { step } => {
                write!(f, "Langevin step size collapsed to {step} without a finite proposal")
            }
            SamplerError::Selection(err) => write!(f, "Sampler selection input: {err}"),
            SamplerError::Linalg(err) => write!(f, "Sampler linear algebra: {err}"),
        }
    }
}

impl From<SelectionError> for SamplerError {
    fn from(err: SelectionError) -> Self {
        SamplerError::Selection(err)
    }
}

impl From<LinalgError> for SamplerError {
    fn from(err: LinalgError) -> Self {
        SamplerError::Linalg(err)
    }
}
