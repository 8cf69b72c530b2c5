//! adjusted_mle — approximate selective maximum-likelihood estimation.
//!
//! Purpose
//! -------
//! Point estimates of a target mean that account for selection, without
//! sampling: the truncated normalizing constant is replaced by a barrier
//! approximation and the score equation reduces to one convex solve.
//!
//! Key behaviors
//! -------------
//! - [`solve_barrier_nonneg`] minimizes the barrier-smoothed quadratic over
//!   the positive orthant with a damped Newton method.
//! - [`solve_umvu`] builds the quadratic blocks from the target and
//!   optimization transforms and returns a [`SelectiveMle`] holding the
//!   estimate, the barrier value, the Jacobian and a reusable [`MleMap`].
//! - [`bootstrap_mle`] pushes row-resampled data through a fixed map.
//!
//! Invariants & assumptions
//! ------------------------
//! - Selection is encoded as nonnegativity of the optimization variables.
//! - Failures are reported through [`MleError`]; hitting the barrier
//!   iteration cap is logged, not raised.
//!
//! Testing notes
//! -------------
//! - The one-dimensional thresholded problem has a closed-form barrier
//!   optimum used by the barrier, MLE and round-trip tests.
pub mod barrier;
pub mod bootstrap;
pub mod errors;
pub mod selective_mle;

pub use self::barrier::{BarrierOptions, BarrierSolution, solve_barrier_nonneg};
pub use self::bootstrap::bootstrap_mle;
pub use self::errors::{MleError, MleResult};
pub use self::selective_mle::{
    MleFit, MleMap, SelectiveMle, solve_umvu, solve_umvu_with_options,
};

pub mod prelude {
    pub use super::barrier::BarrierOptions;
    pub use super::bootstrap::bootstrap_mle;
    pub use super::errors::{MleError, MleResult};
    pub use super::selective_mle::{MleMap, SelectiveMle, solve_umvu};
}
