//! constraints::affine — Gaussian law truncated to `{z : A z ≤ b}`.
//!
//! Purpose
//! -------
//! Hold the four pieces that pin down a truncated Gaussian target: the
//! inequality system `(A, b)` and the untruncated `(mean, covariance)`.
//! The record is immutable once built; a refit of the selection procedure
//! produces a new one.
//!
//! Invariants & assumptions
//! ------------------------
//! - `A` is `m × d`, `b` has length `m`, `mean` has length `d` and
//!   `covariance` is `d × d` and symmetric. Checked in [`AffineConstraints::new`].
//! - `m = 0` is allowed and means "no inequality constraints".
use ndarray::{Array1, Array2, ArrayView1};

use crate::linalg::{LinalgError, LinalgResult, max_asymmetry};

/// Symmetry tolerance accepted for the covariance.
const SYMMETRY_TOL: f64 = 1e-8;

/// Truncated-Gaussian region `{z : A z ≤ b}` with its Gaussian law.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineConstraints {
    linear_part: Array2<f64>,
    offset: Array1<f64>,
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

impl AffineConstraints {
    /// Build and validate an affine region.
    ///
    /// # Errors
    /// - [`LinalgError::DimensionMismatch`] if the shapes are inconsistent.
    /// - [`LinalgError::NotSquare`] if `covariance` is not square.
    /// - [`LinalgError::NotSymmetric`] if the covariance is not symmetric to
    ///   within `1e-8`.
    pub fn new(
        linear_part: Array2<f64>, offset: Array1<f64>, mean: Array1<f64>, covariance: Array2<f64>,
    ) -> LinalgResult<Self> {
        let d = mean.len();
        let (rows, cols) = covariance.dim();
        if rows != cols {
            return Err(LinalgError::NotSquare { rows, cols });
        }
        if rows != d {
            return Err(LinalgError::DimensionMismatch {
                context: "affine covariance",
                expected: d,
                found: rows,
            });
        }
        if linear_part.ncols() != d && linear_part.nrows() > 0 {
            return Err(LinalgError::DimensionMismatch {
                context: "affine linear part",
                expected: d,
                found: linear_part.ncols(),
            });
        }
        if offset.len() != linear_part.nrows() {
            return Err(LinalgError::DimensionMismatch {
                context: "affine offset",
                expected: linear_part.nrows(),
                found: offset.len(),
            });
        }
        let asym = max_asymmetry(&covariance.view());
        if asym > SYMMETRY_TOL {
            return Err(LinalgError::NotSymmetric { context: "affine covariance", asymmetry: asym });
        }
        Ok(Self { linear_part, offset, mean, covariance })
    }

    pub fn linear_part(&self) -> &Array2<f64> {
        &self.linear_part
    }

    pub fn offset(&self) -> &Array1<f64> {
        &self.offset
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Dimension of the constrained variable.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Number of inequality rows.
    pub fn num_constraints(&self) -> usize {
        self.offset.len()
    }

    /// Slack `b − A z`; nonnegative entries are satisfied rows.
    pub fn slack(&self, z: &ArrayView1<f64>) -> LinalgResult<Array1<f64>> {
        if z.len() != self.dim() {
            return Err(LinalgError::DimensionMismatch {
                context: "affine slack",
                expected: self.dim(),
                found: z.len(),
            });
        }
        if self.num_constraints() == 0 {
            return Ok(Array1::zeros(0));
        }
        Ok(&self.offset - &self.linear_part.dot(z))
    }

    /// Whether `A z ≤ b + tol` holds row-wise.
    pub fn is_feasible(&self, z: &ArrayView1<f64>, tol: f64) -> LinalgResult<bool> {
        Ok(self.slack(z)?.iter().all(|s| *s >= -tol))
    }
}
