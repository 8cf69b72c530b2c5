//! randomization::precision — scalar or dense randomizer precision.
//!
//! Purpose
//! -------
//! Represent the precision `Q` of a Gaussian-like randomizer either as a
//! scalar multiple of the identity or as a dense matrix, and implement the
//! handful of products every conditional-law computation needs against
//! both shapes.
//!
//! Key behaviors
//! -------------
//! - [`RandomizerPrecision::apply`] computes `Q v`.
//! - [`RandomizerPrecision::apply_matrix`] computes `Q M`.
//! - [`RandomizerPrecision::conditional_precision`] computes `Lᵀ Q L`, the
//!   precision of the optimization variables given the score.
//! - [`RandomizerPrecision::quadratic`] computes `vᵀ Q v`.
//!
//! Conventions
//! -----------
//! - `Isotropic(q)` means `Q = q · I`. Its dimension is taken from the
//!   operand, so a single scalar serves every problem size.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::linalg::{LinalgError, LinalgResult};

/// Precision of the randomization noise.
#[derive(Debug, Clone, PartialEq)]
pub enum RandomizerPrecision {
    /// `Q = q · I`.
    Isotropic(f64),
    /// Dense symmetric positive-definite `Q`.
    General(Array2<f64>),
}

impl RandomizerPrecision {
    /// Dimension of a dense precision, `None` for the isotropic case.
    pub fn dim(&self) -> Option<usize> {
        match self {
            RandomizerPrecision::Isotropic(_) => None,
            RandomizerPrecision::General(q) => Some(q.nrows()),
        }
    }

    fn check_rows(&self, rows: usize, context: &'static str) -> LinalgResult<()> {
        match self.dim() {
            Some(d) if d != rows => {
                Err(LinalgError::DimensionMismatch { context, expected: d, found: rows })
            }
            _ => Ok(()),
        }
    }

    /// `Q v`.
    pub fn apply(&self, v: &ArrayView1<f64>) -> LinalgResult<Array1<f64>> {
        self.check_rows(v.len(), "randomizer precision product")?;
        Ok(match self {
            RandomizerPrecision::Isotropic(q) => v.mapv(|x| q * x),
            RandomizerPrecision::General(q) => q.dot(v),
        })
    }

    /// `Q M`.
    pub fn apply_matrix(&self, m: &ArrayView2<f64>) -> LinalgResult<Array2<f64>> {
        self.check_rows(m.nrows(), "randomizer precision product")?;
        Ok(match self {
            RandomizerPrecision::Isotropic(q) => m.mapv(|x| q * x),
            RandomizerPrecision::General(q) => q.dot(m),
        })
    }

    /// `vᵀ Q v`.
    pub fn quadratic(&self, v: &ArrayView1<f64>) -> LinalgResult<f64> {
        Ok(v.dot(&self.apply(v)?))
    }

    /// conditional_precision — `Lᵀ Q L` for an optimization transform `L`.
    ///
    /// Parameters
    /// ----------
    /// - `opt_linear`: `p × d` matrix mapping optimization variables into
    ///   randomization space.
    ///
    /// Returns
    /// -------
    /// The `d × d` precision of the optimization variables conditional on
    /// the score. Symmetrized before returning.
    ///
    /// Errors
    /// ------
    /// - [`LinalgError::DimensionMismatch`] if a dense `Q` is not `p × p`.
    pub fn conditional_precision(&self, opt_linear: &ArrayView2<f64>) -> LinalgResult<Array2<f64>> {
        let q_l = self.apply_matrix(opt_linear)?;
        let mut k = opt_linear.t().dot(&q_l);
        crate::linalg::symmetrize(&mut k);
        Ok(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The isotropic and dense branches must agree when the dense matrix is
    // itself a scaled identity.
    //
    // Given
    // -----
    // - q = 0.25, L a 3 × 2 matrix.
    //
    // Expect
    // ------
    // - `conditional_precision` and `apply` match entrywise.
    fn isotropic_and_general_branches_agree_on_scaled_identity() {
        // Arrange
        let l = array![[1.0, 0.0], [2.0, -1.0], [0.5, 3.0]];
        let iso = RandomizerPrecision::Isotropic(0.25);
        let dense = RandomizerPrecision::General(Array2::eye(3) * 0.25);
        let v = array![1.0, -2.0, 4.0];

        // Act
        let k_iso = iso.conditional_precision(&l.view()).unwrap();
        let k_dense = dense.conditional_precision(&l.view()).unwrap();

        // Assert
        assert!((&k_iso - &k_dense).iter().all(|x| x.abs() < 1e-14));
        let qv = iso.apply(&v.view()).unwrap();
        assert!((&qv - &dense.apply(&v.view()).unwrap()).iter().all(|x| x.abs() < 1e-14));
        assert!((iso.quadratic(&v.view()).unwrap() - 0.25 * 21.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A dense precision of the wrong size is rejected rather than broadcast.
    fn general_precision_rejects_mismatched_operand() {
        let dense = RandomizerPrecision::General(Array2::eye(2));
        let l = Array2::<f64>::zeros((3, 1));
        let err = dense.conditional_precision(&l.view()).unwrap_err();
        assert!(matches!(err, LinalgError::DimensionMismatch { expected: 2, found: 3, .. }));
    }
}
