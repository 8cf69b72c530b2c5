//! constraints — affine regions carrying a Gaussian law.
//!
//! [`AffineConstraints`] is the truncated-Gaussian target handed from the
//! selection builders to the conditional sampler.

pub mod affine;

pub use self::affine::AffineConstraints;

pub mod prelude {
    pub use super::affine::AffineConstraints;
}
