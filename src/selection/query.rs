//! selection::query — the contract every selection variant fulfils once it
//! is ready to be sampled.
//!
//! Purpose
//! -------
//! Decouple downstream consumers (the conditional sampler, target
//! inference) from the concrete selection procedure. Both the M-estimator
//! and the screening variant hand out a value implementing [`Query`] only
//! after all setup is done, so consumers never observe a half-built state.
//!
//! Key behaviors
//! -------------
//! - [`FeasibleRegion`] is the set the optimization state must stay in:
//!   the nonnegative orthant for screening, or the KKT region
//!   (scalings ≥ 0, free unpenalized block, subgradient in the scaled dual
//!   ball) for the M-estimator. [`FeasibleRegion::project`] is idempotent.
//! - [`Query::projection`] and [`Query::sampler`] have default
//!   implementations in terms of the required accessors.
use std::ops::Range;

use ndarray::{Array1, ArrayView1, s};

use crate::{
    constraints::AffineConstraints,
    randomization::Randomizer,
    sampling::{
        affine_gaussian::AffineGaussianSampler, errors::SamplerResult,
        log_density::GaussianLogDensity,
    },
    selection::{
        decomposition::{ConditionalGaussian, LinearDecomposition},
        errors::{SelectionError, SelectionResult},
        event::SelectionEvent,
        penalty::GroupLassoDual,
    },
};

/// Set of optimization states consistent with the observed selection.
#[derive(Debug, Clone, PartialEq)]
pub enum FeasibleRegion {
    /// `{o : o ≥ 0}`.
    NonNegative { dim: usize },
    /// Scalings nonnegative, subgradient inside `dual`, everything else free.
    Kkt { scalings: Range<usize>, subgradient: Range<usize>, dual: GroupLassoDual, dim: usize },
}

impl FeasibleRegion {
    pub fn dim(&self) -> usize {
        match self {
            FeasibleRegion::NonNegative { dim } | FeasibleRegion::Kkt { dim, .. } => *dim,
        }
    }

    /// Euclidean projection onto the region.
    pub fn project(&self, x: &ArrayView1<f64>) -> Array1<f64> {
        match self {
            FeasibleRegion::NonNegative { .. } => x.mapv(|v| v.max(0.0)),
            FeasibleRegion::Kkt { scalings, subgradient, dual, .. } => {
                let mut out = x.to_owned();
                out.slice_mut(s![scalings.clone()]).mapv_inplace(|v| v.max(0.0));
                let projected = dual.bound_prox(&x.slice(s![subgradient.clone()]));
                out.slice_mut(s![subgradient.clone()]).assign(&projected);
                out
            }
        }
    }

    /// Whether `x` lies in the region up to `tol`.
    pub fn contains(&self, x: &ArrayView1<f64>, tol: f64) -> bool {
        if x.len() != self.dim() {
            return false;
        }
        match self {
            FeasibleRegion::NonNegative { .. } => x.iter().all(|&v| v >= -tol),
            FeasibleRegion::Kkt { scalings, subgradient, dual, .. } => {
                x.slice(s![scalings.clone()]).iter().all(|&v| v >= -tol)
                    && dual.contains(&x.slice(s![subgradient.clone()]), tol)
            }
        }
    }
}

/// A selection procedure that has been fit and set up for sampling.
pub trait Query {
    fn selection_variable(&self) -> &SelectionEvent;

    fn observed_opt_state(&self) -> &Array1<f64>;

    fn observed_score_state(&self) -> &Array1<f64>;

    fn decomposition(&self) -> &LinearDecomposition;

    fn feasible_region(&self) -> &FeasibleRegion;

    /// Affine region `{A o ≤ b}` with the conditional Gaussian law of `o`.
    fn constraints(&self) -> &AffineConstraints;

    fn conditional(&self) -> &ConditionalGaussian;

    fn randomizer(&self) -> &Randomizer;

    /// Project an optimization state onto the feasible region.
    ///
    /// # Errors
    /// [`SelectionError::DimensionMismatch`] if `opt_state` has the wrong
    /// length.
    fn projection(&self, opt_state: &ArrayView1<f64>) -> SelectionResult<Array1<f64>> {
        let region = self.feasible_region();
        if opt_state.len() != region.dim() {
            return Err(SelectionError::DimensionMismatch {
                context: "projection input",
                expected: region.dim(),
                found: opt_state.len(),
            });
        }
        Ok(region.project(opt_state))
    }

    /// Projected-Langevin sampler targeting the law of the optimization
    /// state given the observed score and the selection event.
    fn sampler(&self) -> SamplerResult<AffineGaussianSampler> {
        let density =
            GaussianLogDensity::new(self.decomposition().clone(), self.randomizer().precision())?;
        AffineGaussianSampler::new(
            density,
            self.feasible_region().clone(),
            self.constraints().clone(),
            self.observed_opt_state().clone(),
            self.observed_score_state().clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::penalty::GroupLasso;
    use ndarray::array;

    fn kkt_region() -> FeasibleRegion {
        // One scaling, one free coordinate, a 2-d group of radius 1 and a
        // singleton of radius 0.5.
        let pen = GroupLasso::new(vec![0, 0, 1], vec![2.0, 1.0]).unwrap();
        FeasibleRegion::Kkt {
            scalings: 0..1,
            subgradient: 2..5,
            dual: pen.dual(&[0, 1, 2], 0.5),
            dim: 5,
        }
    }

    #[test]
    // Purpose
    // -------
    // Projection is idempotent and leaves feasible points unchanged.
    //
    // Given
    // -----
    // - KKT region with blocks [scaling | free | subgradient(2 + 1)].
    //
    // Expect
    // ------
    // - proj(proj(x)) == proj(x); proj(x) is contained; a feasible point
    //   is a fixed point.
    fn kkt_projection_is_idempotent() {
        // Arrange
        let region = kkt_region();
        let x = array![-1.0, -7.0, 3.0, 4.0, -2.0];

        // Act
        let once = region.project(&x.view());
        let twice = region.project(&once.view());

        // Assert
        assert_eq!(once, twice);
        assert!(region.contains(&once.view(), 1e-12));
        assert_eq!(once[0], 0.0);
        assert_eq!(once[1], -7.0);
        assert!((once[2] - 0.6).abs() < 1e-12 && (once[3] - 0.8).abs() < 1e-12);
        assert_eq!(once[4], -0.5);

        let feasible = array![2.0, 1.0, 0.1, -0.2, 0.3];
        assert_eq!(region.project(&feasible.view()), feasible);
    }

    #[test]
    fn nonnegative_projection_clips_negatives() {
        let region = FeasibleRegion::NonNegative { dim: 3 };
        let out = region.project(&array![-1.0, 0.0, 2.0].view());
        assert_eq!(out, array![0.0, 0.0, 2.0]);
        assert!(!region.contains(&array![-0.1, 0.0, 0.0].view(), 1e-3));
    }
}
