//! sampling — conditional sampling of the optimization state.
//!
//! Purpose
//! -------
//! Draw from the law of the optimization variables given the observed
//! score and the selection event: a randomizer density over
//! `(score, opt)` pairs truncated to the feasible region of the selection.
//!
//! Key behaviors
//! -------------
//! - [`LogDensity`] is the functional the chain climbs;
//!   [`GaussianLogDensity`] implements it for Gaussian randomizers.
//! - [`ProjectedLangevin`] is a discrete Langevin chain with a projection
//!   after every proposal, so all states are feasible.
//! - [`AffineGaussianSampler`] owns one fitted selection's pieces and
//!   produces draws, transformed draws, p-values and intervals.
//!
//! Invariants & assumptions
//! ------------------------
//! - Randomness comes only from the caller's RNG; a seeded `StdRng`
//!   reproduces a chain exactly.
//! - Chains are single-threaded and run to completion within a call.
//!
//! Testing notes
//! -------------
//! - The one-dimensional truncated Gaussian has a closed-form mean used as
//!   a calibration check for the chain.

pub mod affine_gaussian;
pub mod errors;
pub mod langevin;
pub mod log_density;
pub mod options;

pub use self::affine_gaussian::AffineGaussianSampler;
pub use self::errors::{SamplerError, SamplerResult};
pub use self::langevin::ProjectedLangevin;
pub use self::log_density::{GaussianLogDensity, LogDensity};
pub use self::options::SamplerOptions;

pub mod prelude {
    pub use super::affine_gaussian::AffineGaussianSampler;
    pub use super::errors::{SamplerError, SamplerResult};
    pub use super::log_density::{GaussianLogDensity, LogDensity};
    pub use super::options::SamplerOptions;
}
