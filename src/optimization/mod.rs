//! optimization — solvers behind the selection builders, plus a unified
//! error surface.
//!
//! Purpose
//! -------
//! Provide the two optimizers a randomized selection procedure needs: a
//! proximal solver for the penalized randomized program, and an
//! argmin-backed L-BFGS maximizer for the unpenalized restricted refit on
//! a selected support.
//!
//! Key behaviors
//! -------------
//! - [`proximal::solve_penalized`] runs FISTA on
//!   `ℓ(β) + ε/2‖β‖² − ωᵀβ + P(β)` under [`proximal::SolveOptions`].
//! - [`refit::maximize`] maximizes a smooth concave objective with argmin's
//!   L-BFGS and a configurable line search.
//! - Configuration issues, numerical failures and backend solver errors are
//!   normalized into [`errors::OptError`] with the alias `OptResult<T>`.
//!
//! Conventions
//! -----------
//! - The refit maximizes `f` by handing `−f` to argmin; outcomes are
//!   reported on the scale of `f`.
//! - Solvers log through the `log` facade and never install a logger.
//!
//! Testing notes
//! -------------
//! - `refit`: option validation and concave quadratics with known optima.
//! - `proximal`: soft-thresholding on orthonormal designs and KKT checks on
//!   correlated designs.

pub mod errors;
pub mod proximal;
pub mod refit;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::proximal::{ProximalOutcome, SolveOptions, solve_penalized};
    pub use super::refit::prelude::*;
}
