//! selection — randomized selection procedures and their affine
//! description.
//!
//! Purpose
//! -------
//! Turn a randomized selection procedure into the ingredients of selective
//! inference: the selection event, the observed optimization and score
//! states, and a linear decomposition `ω = S·s + s_off + L·o + o_off` of
//! the perturbation. From these the conditional Gaussian of the
//! optimization state and its feasible region follow.
//!
//! Key behaviors
//! -------------
//! - Two variants implement the shared [`Query`] contract:
//!   - [`m_estimator`]: randomized group lasso on a [`SmoothLoss`], staged
//!     as `MEstimator → SolvedMEstimator → MEstimatorQuery`.
//!   - [`screening`]: randomized thresholding of a score vector.
//! - [`decomposition::conditional_gaussian`] is the single place where the
//!   conditional law is computed, for scalar and dense randomizer
//!   precision alike.
//! - Collaborators: [`loss`] (Gaussian and logistic losses, restricted
//!   refits) and [`penalty`] (group lasso and its dual ball).
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`SelectionEvent`] carries zero signs on unselected coordinates.
//! - An empty selection is a valid outcome; consumers check
//!   [`SelectionEvent::is_empty`].
//! - Singular conditional precisions are reported, never regularized.
//!
//! Downstream usage
//! ----------------
//! - `sampling` builds an `AffineGaussianSampler` from any [`Query`] via
//!   [`Query::sampler`].
//! - `inference` consumes `Target`s produced by `parametric_targets`,
//!   `multivariate_targets` and `marginal_targets`.

pub mod decomposition;
pub mod errors;
pub mod event;
pub mod loss;
pub mod m_estimator;
pub mod penalty;
pub mod query;
pub mod screening;

pub use self::decomposition::{
    AffineTransform, ConditionalGaussian, LinearDecomposition, OptStateLayout,
    conditional_gaussian,
};
pub use self::errors::{SelectionError, SelectionResult};
pub use self::event::SelectionEvent;
pub use self::loss::{GaussianLoss, LogisticLoss, LossData, SmoothLoss, restricted_mest};
pub use self::m_estimator::{MEstimator, MEstimatorQuery, SolvedMEstimator};
pub use self::penalty::{GroupLasso, GroupLassoDual};
pub use self::query::{FeasibleRegion, Query};
pub use self::screening::{ScreeningProblem, ScreeningQuery};

pub mod prelude {
    pub use super::decomposition::{AffineTransform, LinearDecomposition, OptStateLayout};
    pub use super::errors::{SelectionError, SelectionResult};
    pub use super::event::SelectionEvent;
    pub use super::loss::{GaussianLoss, LogisticLoss, SmoothLoss};
    pub use super::m_estimator::{MEstimator, MEstimatorQuery, SolvedMEstimator};
    pub use super::penalty::GroupLasso;
    pub use super::query::{FeasibleRegion, Query};
    pub use super::screening::{ScreeningProblem, ScreeningQuery};
}
