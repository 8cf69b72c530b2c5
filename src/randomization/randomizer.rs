//! randomization::randomizer — perturbation laws used to randomize selection.
//!
//! Purpose
//! -------
//! Draw the additive noise `ω` that randomizes a selection procedure and
//! expose the second-moment information `(covariance, precision)` that
//! downstream conditional-law computations need.
//!
//! Key behaviors
//! -------------
//! - Three laws: isotropic Gaussian `N(0, σ² I)`, general Gaussian
//!   `N(0, Σ)`, and i.i.d. Laplace with scale `b`.
//! - [`Randomizer::sample`] advances a caller-supplied RNG; determinism is
//!   obtained by seeding that RNG (`StdRng::seed_from_u64`).
//! - [`Randomizer::cov_prec`] returns the covariance as a dense matrix and
//!   the precision as a [`RandomizerPrecision`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Scales are finite and strictly positive; a general covariance is SPD.
//!   Both are validated once at construction.
//! - The Laplace law is summarized by its Gaussian moment match:
//!   covariance `2b² I`, precision `I / (2b²)`.
//!
//! Testing notes
//! -------------
//! - Unit tests check moment agreement of seeded draws and the closed-form
//!   precision of each law.
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;
use statrs::distribution::Laplace;

use crate::{
    linalg::{cholesky_lower, spd_inverse},
    randomization::{
        errors::{RandomizerError, RandomizerResult},
        precision::RandomizerPrecision,
    },
};

/// Additive randomization law on `R^p`.
#[derive(Debug, Clone, PartialEq)]
pub enum Randomizer {
    IsotropicGaussian {
        dim: usize,
        scale: f64,
    },
    Gaussian {
        covariance: Array2<f64>,
        precision: Array2<f64>,
        cholesky: Array2<f64>,
    },
    Laplace {
        dim: usize,
        scale: f64,
        law: Laplace,
    },
}

fn check_scale(scale: f64) -> RandomizerResult<()> {
    if !scale.is_finite() {
        return Err(RandomizerError::InvalidScale { scale, reason: "Scale must be finite." });
    }
    if scale <= 0.0 {
        return Err(RandomizerError::InvalidScale { scale, reason: "Scale must be positive." });
    }
    Ok(())
}

impl Randomizer {
    /// Isotropic Gaussian `N(0, scale² I_dim)`.
    ///
    /// # Errors
    /// - [`RandomizerError::ZeroDimension`] if `dim == 0`.
    /// - [`RandomizerError::InvalidScale`] if `scale` is not finite and positive.
    pub fn isotropic_gaussian(dim: usize, scale: f64) -> RandomizerResult<Self> {
        if dim == 0 {
            return Err(RandomizerError::ZeroDimension);
        }
        check_scale(scale)?;
        Ok(Randomizer::IsotropicGaussian { dim, scale })
    }

    /// Gaussian `N(0, covariance)` with a dense SPD covariance.
    ///
    /// # Errors
    /// - [`RandomizerError::ZeroDimension`] for an empty covariance.
    /// - [`RandomizerError::Linalg`] if the covariance is not SPD.
    pub fn gaussian(covariance: Array2<f64>) -> RandomizerResult<Self> {
        if covariance.nrows() == 0 {
            return Err(RandomizerError::ZeroDimension);
        }
        let cholesky = cholesky_lower(&covariance.view(), "randomizer covariance")?;
        let precision = spd_inverse(&covariance.view(), "randomizer covariance")?;
        Ok(Randomizer::Gaussian { covariance, precision, cholesky })
    }

    /// I.i.d. Laplace with location 0 and the given scale.
    ///
    /// # Errors
    /// - [`RandomizerError::ZeroDimension`] if `dim == 0`.
    /// - [`RandomizerError::InvalidScale`] if `scale` is not finite and positive.
    pub fn laplace(dim: usize, scale: f64) -> RandomizerResult<Self> {
        if dim == 0 {
            return Err(RandomizerError::ZeroDimension);
        }
        check_scale(scale)?;
        let law = Laplace::new(0.0, scale).map_err(|_| RandomizerError::InvalidScale {
            scale,
            reason: "Rejected by the Laplace distribution.",
        })?;
        Ok(Randomizer::Laplace { dim, scale, law })
    }

    /// Dimension of a single draw.
    pub fn dim(&self) -> usize {
        match self {
            Randomizer::IsotropicGaussian { dim, .. } | Randomizer::Laplace { dim, .. } => *dim,
            Randomizer::Gaussian { covariance, .. } => covariance.nrows(),
        }
    }

    /// Draw one perturbation vector.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        match self {
            Randomizer::IsotropicGaussian { dim, scale } => {
                Array1::from_shape_fn(*dim, |_| scale * rng.sample::<f64, _>(StandardNormal))
            }
            Randomizer::Gaussian { cholesky, .. } => {
                let z = Array1::from_shape_fn(cholesky.nrows(), |_| {
                    rng.sample::<f64, _>(StandardNormal)
                });
                cholesky.dot(&z)
            }
            Randomizer::Laplace { dim, law, .. } => {
                Array1::from_shape_fn(*dim, |_| rng.sample::<f64, _>(law))
            }
        }
    }

    /// Draw `n` perturbations as the rows of an `n × p` matrix.
    pub fn sample_n<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        let p = self.dim();
        let mut out = Array2::<f64>::zeros((n, p));
        for mut row in out.rows_mut() {
            row.assign(&self.sample(rng));
        }
        out
    }

    /// Dense covariance of a single draw.
    pub fn covariance(&self) -> Array2<f64> {
        match self {
            Randomizer::IsotropicGaussian { dim, scale } => Array2::eye(*dim) * scale.powi(2),
            Randomizer::Gaussian { covariance, .. } => covariance.clone(),
            Randomizer::Laplace { dim, scale, .. } => Array2::eye(*dim) * (2.0 * scale.powi(2)),
        }
    }

    /// Precision of a single draw, scalar when the law is isotropic.
    pub fn precision(&self) -> RandomizerPrecision {
        match self {
            Randomizer::IsotropicGaussian { scale, .. } => {
                RandomizerPrecision::Isotropic(1.0 / scale.powi(2))
            }
            Randomizer::Gaussian { precision, .. } => {
                RandomizerPrecision::General(precision.clone())
            }
            Randomizer::Laplace { scale, .. } => {
                RandomizerPrecision::Isotropic(1.0 / (2.0 * scale.powi(2)))
            }
        }
    }

    /// `(covariance, precision)` pair.
    pub fn cov_prec(&self) -> (Array2<f64>, RandomizerPrecision) {
        (self.covariance(), self.precision())
    }
}
