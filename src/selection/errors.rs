//! Error surface for selection-event builders and their collaborators.
//!
//! Linear-algebra, optimizer and randomizer failures are wrapped so that
//! `?` composes across layers; everything else is a problem with the
//! selection inputs themselves.

use crate::{linalg::LinalgError, optimization::errors::OptError, randomization::RandomizerError};

/// Result alias for selection builders.
pub type SelectionResult<T> = Result<T, SelectionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    // ---- Shapes ----
    /// Two inputs disagree on a dimension.
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    // ---- Model support ----
    /// The loss only exposes an abstract linear transform, so a restricted
    /// refit on a column subset cannot be formed.
    UnsupportedModel {
        context: &'static str,
    },

    // ---- Tuning inputs ----
    /// Sampler scaling below the Lipschitz constant of the loss gradient.
    InvalidScaling {
        scaling: f64,
        lipschitz: f64,
    },
    /// Ridge term must be finite and nonnegative.
    InvalidEpsilon {
        epsilon: f64,
    },
    /// Screening thresholds must be finite and positive.
    InvalidThreshold {
        index: usize,
        value: f64,
    },
    /// Marginal level must lie in (0, 1).
    InvalidLevel {
        level: f64,
    },
    /// Dispersion must be finite and positive.
    InvalidDispersion {
        dispersion: f64,
    },

    // ---- Penalty structure ----
    /// Coordinate assigned to a group label with no weight.
    InvalidGroup {
        index: usize,
        group: usize,
        num_groups: usize,
    },
    /// Group label that owns no coordinates.
    EmptyGroup {
        group: usize,
    },
    /// Group weight must be finite and nonnegative.
    InvalidWeight {
        group: usize,
        weight: f64,
    },

    // ---- Targets ----
    /// Target requested for an empty feature set.
    EmptyFeatures,

    // ---- Wrapped ----
    Linalg(LinalgError),
    Optimization(OptError),
    Randomizer(RandomizerError),
}

impl std::error::Error for SelectionError {}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shapes ----
            SelectionError::DimensionMismatch { context, expected, found } => {
                write!(f, "Dimension mismatch in {context}: expected {expected}, found {found}")
            }

            // ---- Model support ----
            SelectionError::UnsupportedModel { context } => {
                write!(f, "Not implemented for this model: {context}")
            }

            // ---- Tuning inputs ----
            SelectionError::InvalidScaling { scaling, lipschitz } => write!(
                f,
                "Sampler scaling {scaling} is below the loss Lipschitz constant {lipschitz}"
            ),
            SelectionError::InvalidEpsilon { epsilon } => {
                write!(f, "Invalid ridge term {epsilon}: must be finite and nonnegative")
            }
            SelectionError::InvalidThreshold { index, value } => {
                write!(f, "Invalid threshold at index {index}: {value}, must be finite and > 0")
            }
            SelectionError::InvalidLevel { level } => {
                write!(f, "Invalid marginal level {level}: must lie in (0, 1)")
            }
            SelectionError::InvalidDispersion { dispersion } => {
                write!(f, "Invalid dispersion {dispersion}: must be finite and > 0")
            }

            // ---- Penalty structure ----
            SelectionError::InvalidGroup { index, group, num_groups } => write!(
                f,
                "Coordinate {index} has group {group}, but only {num_groups} group weights exist"
            ),
            SelectionError::EmptyGroup { group } => {
                write!(f, "Group {group} owns no coordinates")
            }
            SelectionError::InvalidWeight { group, weight } => {
                write!(f, "Invalid weight {weight} for group {group}: must be finite and >= 0")
            }

            // ---- Targets ----
            SelectionError::EmptyFeatures => write!(f, "Target feature set is empty"),

            // ---- Wrapped ----
            SelectionError::Linalg(err) => write!(f, "Selection linear algebra: {err}"),
            SelectionError::Optimization(err) => write!(f, "Selection optimizer: {err}"),
            SelectionError::Randomizer(err) => write!(f, "Selection randomizer: {err}"),
        }
    }
}

impl From<LinalgError> for SelectionError {
    fn from(err: LinalgError) -> Self {
        SelectionError::Linalg(err)
    }
}

impl From<OptError> for SelectionError {
    fn from(err: OptError) -> Self {
        SelectionError::Optimization(err)
    }
}

impl From<RandomizerError> for SelectionError {
    fn from(err: RandomizerError) -> Self {
        SelectionError::Randomizer(err)
    }
}
