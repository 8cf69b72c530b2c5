//! selective_inference — inference after randomized convex selection.
//!
//! Purpose
//! -------
//! Serve as the crate root for a single-process numerical library that fits
//! a randomized selection procedure (a penalized M-estimator or a
//! thresholding screen), describes the selection event as an affine region
//! in the optimization variables, and then performs inference that
//! conditions on that event: projected-Langevin sampling of the
//! optimization state, selective p-values and confidence intervals, and an
//! approximate selective MLE.
//!
//! Key behaviors
//! -------------
//! - [`randomization`]: randomizers (isotropic or general Gaussian,
//!   Laplace) with their covariance and precision.
//! - [`selection`]: the loss and penalty collaborators, the
//!   [`Query`](selection::Query) contract, and the two variants
//!   [`MEstimator`](selection::MEstimator) and
//!   [`ScreeningProblem`](selection::ScreeningProblem).
//! - [`constraints`]: the affine region `A o ≤ b` with its conditional
//!   Gaussian law.
//! - [`optimization`]: the FISTA solver for the randomized program and the
//!   argmin L-BFGS refit of a selected model.
//! - [`sampling`]: the conditional sampler over the optimization state.
//! - [`inference`]: targets, pivots and selective intervals.
//! - [`adjusted_mle`]: barrier-approximated selective MLE and its bootstrap.
//! - [`linalg`]: dense helpers bridging `ndarray` and `nalgebra`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything runs to completion on the calling thread; the only shared
//!   resource is the caller's random number generator, passed as
//!   `&mut R where R: rand::Rng`.
//! - Numerical singularities propagate as errors; nothing is jittered or
//!   retried internally.
//!
//! Conventions
//! -----------
//! - Every concern has its own error enum and `XxxResult<T>` alias; `From`
//!   conversions let `?` cross layers.
//! - Logging goes through the `log` facade. The crate never installs a
//!   logger.
//!
//! Downstream usage
//! ----------------
//! - `use selective_inference::prelude::*;` surfaces the types needed for a
//!   fit-sample-infer pipeline.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code; end-to-end scenarios live in
//!   `tests/integration_selective_pipeline.rs`.

pub mod adjusted_mle;
pub mod constraints;
pub mod inference;
pub mod linalg;
pub mod optimization;
pub mod randomization;
pub mod sampling;
pub mod selection;

pub mod prelude {
    pub use crate::adjusted_mle::prelude::*;
    pub use crate::constraints::AffineConstraints;
    pub use crate::inference::prelude::*;
    pub use crate::linalg::{LinalgError, LinalgResult};
    pub use crate::optimization::prelude::*;
    pub use crate::randomization::prelude::*;
    pub use crate::sampling::prelude::*;
    pub use crate::selection::prelude::*;
}
