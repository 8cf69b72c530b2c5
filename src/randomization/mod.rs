//! randomization — additive noise laws and their precision.
//!
//! Purpose
//! -------
//! Provide the perturbation `ω` that randomizes a selection procedure, plus
//! the precision representation consumed by every conditional-law
//! computation downstream.
//!
//! Key behaviors
//! -------------
//! - [`Randomizer`] draws perturbations from isotropic Gaussian, general
//!   Gaussian, or Laplace laws with a caller-owned RNG.
//! - [`RandomizerPrecision`] is an explicit `{Isotropic, General}` variant
//!   with methods for `Q v`, `Q M` and `Lᵀ Q L`, so callers never branch on
//!   the shape of the precision themselves.
//!
//! Downstream usage
//! ----------------
//! - Selection builders call [`Randomizer::sample`] once per fit.
//! - Samplers and the selective MLE consume [`Randomizer::precision`].

pub mod errors;
pub mod precision;
pub mod randomizer;

pub use self::errors::{RandomizerError, RandomizerResult};
pub use self::precision::RandomizerPrecision;
pub use self::randomizer::Randomizer;

pub mod prelude {
    pub use super::errors::{RandomizerError, RandomizerResult};
    pub use super::precision::RandomizerPrecision;
    pub use super::randomizer::Randomizer;
}
