//! optimization::refit — unpenalized refits of a selected model.
//!
//! Purpose
//! -------
//! Once a support has been selected, the score of the selected model is
//! built from the unpenalized M-estimator restricted to that support. This
//! module runs that fit: a caller describes a smooth concave objective with
//! [`RefitObjective`] and [`maximize`] hands it to argmin's L-BFGS.
//!
//! Key behaviors
//! -------------
//! - [`objective::NegatedObjective`] poses `max f(θ)` to argmin as
//!   `min −f(θ)` and rejects non-finite values and gradients.
//! - [`RefitOptions`] selects the line search, L-BFGS memory and stopping
//!   rules; [`Tolerances`] needs at least one stopping rule.
//! - [`RefitOutcome`] reports the maximizer and `f(θ̂)` on the objective's
//!   own scale.
//!
//! Conventions
//! -----------
//! - Only analytic gradients are used; every loss in this crate has one.
//! - `verbose` raises the end-of-run summary from `debug!` to `info!`.
pub mod objective;
pub mod options;
pub mod solve;

pub use self::objective::{NegatedObjective, RefitObjective};
pub use self::options::{DEFAULT_LBFGS_MEM, LineSearch, RefitOptions, Tolerances};
pub use self::solve::{RefitOutcome, maximize};

pub mod prelude {
    pub use super::objective::RefitObjective;
    pub use super::options::{LineSearch, RefitOptions, Tolerances};
    pub use super::solve::{RefitOutcome, maximize};
}
