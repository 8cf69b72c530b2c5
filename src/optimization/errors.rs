//! optimization::errors — failures of the proximal solver and the refit.
//!
//! Both solvers report through [`OptError`]. Objectives evaluated inside
//! argmin raise `OptError` values that argmin boxes; the
//! `From<argmin::core::Error>` impl unboxes them so callers match on the
//! original variant. Anything argmin raises on its own becomes
//! [`OptError::Solver`], tagged with a short kind.
use argmin::core::{ArgminError, Error};

pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Proximal solver options ----
    /// `max_its == 0` or `min_its > max_its`.
    InvalidSolveIters { min_its: usize, max_its: usize, reason: &'static str },
    InvalidSolveTol { tol: f64, reason: &'static str },
    /// `1 / (L + ε)` is zero, negative or not finite.
    InvalidStepSize { step: f64 },

    // ---- Refit options ----
    /// No gradient tolerance, cost tolerance or iteration cap was given.
    NoStoppingRule,
    /// A refit tolerance is not finite and positive.
    InvalidTolerance { name: &'static str, value: f64 },
    InvalidMaxIter { max_iter: usize },
    /// L-BFGS history of zero.
    InvalidMemory { mem: usize },
    UnknownLineSearch { name: String },

    // ---- Evaluation ----
    /// Objective, penalty, gradient and start disagree on the dimension.
    DimensionMismatch { context: &'static str, expected: usize, found: usize },
    NonFiniteCost { value: f64 },
    NonFiniteGradient { index: usize, value: f64 },

    // ---- Outcome ----
    /// The solver finished without recording a best parameter.
    MissingEstimate,
    NonFiniteEstimate { index: usize, value: f64 },

    // ---- argmin ----
    Solver { kind: &'static str, text: String },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::InvalidSolveIters { min_its, max_its, reason } => {
                write!(f, "Invalid iteration bounds (min {min_its}, max {max_its}): {reason}")
            }
            OptError::InvalidSolveTol { tol, reason } => {
                write!(f, "Invalid proximal solver tolerance {tol}: {reason}")
            }
            OptError::InvalidStepSize { step } => {
                write!(f, "Invalid proximal step size {step}: must be finite and positive")
            }
            OptError::NoStoppingRule => {
                write!(f, "Refit needs a gradient tolerance, cost tolerance or iteration cap")
            }
            OptError::InvalidTolerance { name, value } => {
                write!(f, "Invalid {name} tolerance {value}: must be finite and positive")
            }
            OptError::InvalidMaxIter { max_iter } => {
                write!(f, "Invalid iteration cap {max_iter}: must be at least one")
            }
            OptError::InvalidMemory { mem } => {
                write!(f, "Invalid L-BFGS memory {mem}: must be at least one")
            }
            OptError::UnknownLineSearch { name } => {
                write!(f, "Unknown line search '{name}': expected 'MoreThuente' or 'HagerZhang'")
            }
            OptError::DimensionMismatch { context, expected, found } => {
                write!(f, "Dimension mismatch in {context}: expected {expected}, found {found}")
            }
            OptError::NonFiniteCost { value } => write!(f, "Non-finite objective value: {value}"),
            OptError::NonFiniteGradient { index, value } => {
                write!(f, "Non-finite gradient entry {value} at index {index}")
            }
            OptError::MissingEstimate => write!(f, "Solver returned no estimate"),
            OptError::NonFiniteEstimate { index, value } => {
                write!(f, "Non-finite estimate {value} at index {index}")
            }
            OptError::Solver { kind, text } => write!(f, "argmin {kind}: {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(inner) => return inner,
            Err(err) => err,
        };
        let text = err.to_string();
        let kind = match err.downcast_ref::<ArgminError>() {
            Some(ArgminError::InvalidParameter { .. }) => "invalid parameter",
            Some(ArgminError::NotImplemented { .. }) => "not implemented",
            Some(ArgminError::NotInitialized { .. }) => "not initialized",
            Some(ArgminError::ConditionViolated { .. }) => "condition violated",
            Some(_) => "error",
            None => "backend error",
        };
        OptError::Solver { kind, text }
    }
}
