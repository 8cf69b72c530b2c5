//! selection::decomposition — affine bookkeeping of the stationarity
//! condition and the conditional Gaussian it induces.
//!
//! Purpose
//! -------
//! Express the first-order condition of a randomized program as
//!
//! ```text
//! ω = S·s + s_off + L·o + o_off
//! ```
//!
//! where `s` is the score state, `o` the optimization state and `ω` the
//! perturbation, and derive the Gaussian law of `o` given `s` implied by a
//! Gaussian randomizer with precision `Q`.
//!
//! Key behaviors
//! -------------
//! - [`AffineTransform`] is a `(linear, offset)` pair with a checked
//!   [`apply`](AffineTransform::apply).
//! - [`LinearDecomposition`] pairs the optimization and score transforms and
//!   reconstructs `ω` from a state pair.
//! - [`OptStateLayout`] names the `[scalings | unpenalized | subgradient]`
//!   blocks of the optimization state.
//! - [`conditional_gaussian`] computes precision `K = LᵀQL`, covariance
//!   `K⁻¹`, `logdens_linear = K⁻¹LᵀQ` and mean
//!   `logdens_linear · (−(S s + s_off) − o_off)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both transforms map into the same `p`-dimensional randomization space.
//! - `L` has full column rank; a singular `K` surfaces as
//!   `LinalgError::NotPositiveDefinite`, with no jitter or retry.
//! - An optimization state of dimension zero is valid and yields empty
//!   conditional arrays.
use std::ops::Range;

use ndarray::{Array1, Array2, ArrayView1};

use crate::{
    linalg::spd_inverse,
    randomization::RandomizerPrecision,
    selection::errors::{SelectionError, SelectionResult},
};

/// Affine map `x ↦ linear · x + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    pub linear: Array2<f64>,
    pub offset: Array1<f64>,
}

impl AffineTransform {
    /// # Errors
    /// [`SelectionError::DimensionMismatch`] if `offset.len() != linear.nrows()`.
    pub fn new(linear: Array2<f64>, offset: Array1<f64>) -> SelectionResult<Self> {
        if offset.len() != linear.nrows() {
            return Err(SelectionError::DimensionMismatch {
                context: "affine transform offset",
                expected: linear.nrows(),
                found: offset.len(),
            });
        }
        Ok(Self { linear, offset })
    }

    pub fn input_dim(&self) -> usize {
        self.linear.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.linear.nrows()
    }

    pub fn apply(&self, x: &ArrayView1<f64>) -> SelectionResult<Array1<f64>> {
        if x.len() != self.input_dim() {
            return Err(SelectionError::DimensionMismatch {
                context: "affine transform input",
                expected: self.input_dim(),
                found: x.len(),
            });
        }
        Ok(self.linear.dot(x) + &self.offset)
    }
}

/// Optimization and score halves of the stationarity condition.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearDecomposition {
    pub opt: AffineTransform,
    pub score: AffineTransform,
}

impl LinearDecomposition {
    /// # Errors
    /// [`SelectionError::DimensionMismatch`] if the two transforms map into
    /// spaces of different dimension.
    pub fn new(opt: AffineTransform, score: AffineTransform) -> SelectionResult<Self> {
        if opt.output_dim() != score.output_dim() {
            return Err(SelectionError::DimensionMismatch {
                context: "decomposition output",
                expected: score.output_dim(),
                found: opt.output_dim(),
            });
        }
        Ok(Self { opt, score })
    }

    /// Dimension of the randomization space.
    pub fn dim(&self) -> usize {
        self.score.output_dim()
    }

    /// `ω = S·s + s_off + L·o + o_off`.
    pub fn reconstruct(
        &self, opt_state: &ArrayView1<f64>, score_state: &ArrayView1<f64>,
    ) -> SelectionResult<Array1<f64>> {
        Ok(self.score.apply(score_state)? + self.opt.apply(opt_state)?)
    }
}

/// Block layout of the optimization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptStateLayout {
    pub scalings: Range<usize>,
    pub unpenalized: Range<usize>,
    pub subgradient: Range<usize>,
}

impl OptStateLayout {
    pub fn new(num_scalings: usize, num_unpenalized: usize, num_subgradient: usize) -> Self {
        let a = num_scalings;
        let b = a + num_unpenalized;
        let c = b + num_subgradient;
        Self { scalings: 0..a, unpenalized: a..b, subgradient: b..c }
    }

    pub fn dim(&self) -> usize {
        self.subgradient.end
    }
}

/// Gaussian law of the optimization state given the score state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalGaussian {
    pub precision: Array2<f64>,
    pub covariance: Array2<f64>,
    pub mean: Array1<f64>,
    /// `K⁻¹ LᵀQ`, `d × p`.
    pub logdens_linear: Array2<f64>,
}

/// conditional_gaussian — law of `o | s` under a Gaussian randomizer.
///
/// Parameters
/// ----------
/// - `decomposition`: `(L, o_off)` and `(S, s_off)` with `ω` reconstructed as
///   above.
/// - `score_state`: observed `s`.
/// - `precision`: randomizer precision `Q`, scalar or dense.
///
/// Returns
/// -------
/// [`ConditionalGaussian`] with `K = LᵀQL`, `K⁻¹`, its mean at `s`, and the
/// `logdens_linear` map.
///
/// Errors
/// ------
/// - [`SelectionError::DimensionMismatch`] on inconsistent shapes.
/// - [`SelectionError::Linalg`] if `K` is not positive definite.
pub fn conditional_gaussian(
    decomposition: &LinearDecomposition, score_state: &ArrayView1<f64>,
    precision: &RandomizerPrecision,
) -> SelectionResult<ConditionalGaussian> {
    let opt_linear = decomposition.opt.linear.view();
    let d = opt_linear.ncols();
    let p = decomposition.dim();
    if d == 0 {
        return Ok(ConditionalGaussian {
            precision: Array2::zeros((0, 0)),
            covariance: Array2::zeros((0, 0)),
            mean: Array1::zeros(0),
            logdens_linear: Array2::zeros((0, p)),
        });
    }

    let cond_precision = precision.conditional_precision(&opt_linear)?;
    let covariance = spd_inverse(&cond_precision.view(), "conditional precision")?;
    let q_l = precision.apply_matrix(&opt_linear)?;
    let logdens_linear = covariance.dot(&q_l.t());

    let shifted = decomposition.score.apply(score_state)? + &decomposition.opt.offset;
    let mean = logdens_linear.dot(&(-shifted));

    Ok(ConditionalGaussian { precision: cond_precision, covariance, mean, logdens_linear })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::min_eigenvalue;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The conditional mean makes the reconstructed perturbation orthogonal
    // to the columns of `L` in the `Q` inner product.
    //
    // Given
    // -----
    // - p = 3, d = 2, dense Q, arbitrary score transform.
    //
    // Expect
    // ------
    // - Lᵀ Q ω(μ, s) = 0 and an SPD covariance.
    fn conditional_mean_solves_normal_equations() {
        // Arrange
        let opt = AffineTransform::new(
            array![[1.0, 0.0], [0.5, 2.0], [0.0, -1.0]],
            array![0.3, -0.2, 0.1],
        )
        .unwrap();
        let score = AffineTransform::new(-Array2::eye(3), array![0.0, 0.1, 0.0]).unwrap();
        let decomposition = LinearDecomposition::new(opt, score).unwrap();
        let q = array![[2.0, 0.3, 0.0], [0.3, 1.0, 0.1], [0.0, 0.1, 1.5]];
        let precision = RandomizerPrecision::General(q.clone());
        let s = array![1.0, -2.0, 0.5];

        // Act
        let cond = conditional_gaussian(&decomposition, &s.view(), &precision).unwrap();

        // Assert
        let omega = decomposition.reconstruct(&cond.mean.view(), &s.view()).unwrap();
        let normal = decomposition.opt.linear.t().dot(&q.dot(&omega));
        assert!(normal.iter().all(|v| v.abs() < 1e-10));
        assert!(min_eigenvalue(&cond.covariance.view()).unwrap() > 0.0);
        let ident = cond.covariance.dot(&cond.precision);
        assert!((ident[[0, 0]] - 1.0).abs() < 1e-10 && ident[[0, 1]].abs() < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Rank-deficient `L` is a numerical singularity, reported as an error.
    fn singular_opt_linear_is_reported() {
        let opt = AffineTransform::new(array![[1.0, 1.0], [1.0, 1.0]], Array1::zeros(2)).unwrap();
        let score = AffineTransform::new(Array2::eye(2), Array1::zeros(2)).unwrap();
        let decomposition = LinearDecomposition::new(opt, score).unwrap();
        let err = conditional_gaussian(
            &decomposition,
            &array![0.0, 0.0].view(),
            &RandomizerPrecision::Isotropic(1.0),
        );
        assert!(matches!(err, Err(SelectionError::Linalg(_))));
    }

    #[test]
    fn layout_blocks_are_contiguous() {
        let layout = OptStateLayout::new(2, 1, 3);
        assert_eq!(layout.scalings, 0..2);
        assert_eq!(layout.unpenalized, 2..3);
        assert_eq!(layout.subgradient, 3..6);
        assert_eq!(layout.dim(), 6);
    }
}
