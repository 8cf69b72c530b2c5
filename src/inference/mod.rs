//! inference — selective p-values and confidence intervals for targets.
//!
//! Purpose
//! -------
//! Provide post-selection inference for linear targets of a selected
//! model, using draws of the optimization state from a conditional sampler.
//!
//! Key behaviors
//! -------------
//! - Describe a target statistic with [`Target`]: observed value,
//!   covariance, cross-covariance with the score, and an [`Alternative`]
//!   per coordinate.
//! - Compute pivots and invert them into intervals with
//!   [`OptimizationIntervals`], which reweights a fixed sample instead of
//!   resampling for every hypothesized value.
//! - Report failures through [`InferenceError`] and [`InferenceResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Targets are jointly Gaussian with the score state; the cross-covariance
//!   is taken against the same score the sampler conditions on.
//! - All routines return [`InferenceError`] on failure rather than
//!   panicking.
//!
//! Downstream usage
//! ----------------
//! - Most callers go through `AffineGaussianSampler::coefficient_pvalues`
//!   and `AffineGaussianSampler::confidence_intervals` in
//!   [`crate::sampling`]; [`OptimizationIntervals`] is public for general
//!   directions `l`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover target validation, alternative parsing, pivot
//!   monotonicity and an interval far from the selection boundary.
pub mod errors;
pub mod intervals;
pub mod targets;

pub use self::errors::{InferenceError, InferenceResult};
pub use self::intervals::OptimizationIntervals;
pub use self::targets::{Alternative, Target};

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::intervals::OptimizationIntervals;
    pub use super::targets::{Alternative, Target};
}
