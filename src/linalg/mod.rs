//! linalg — dense linear algebra shared by selection, sampling, and MLE code.
//!
//! Purpose
//! -------
//! Keep every `ndarray` ↔ `nalgebra` conversion and every matrix
//! factorization in one place. The rest of the crate stores vectors and
//! matrices as `ndarray` containers and calls into this module whenever it
//! needs an inverse, a Cholesky factor, or a spectral bound.
//!
//! Key behaviors
//! -------------
//! - [`to_dmatrix`] / [`from_dmatrix`] copy between `Array2<f64>` and
//!   `nalgebra::DMatrix<f64>`.
//! - [`spd_inverse`] inverts a symmetric positive-definite matrix through a
//!   Cholesky factorization and re-symmetrizes the result.
//! - [`cholesky_lower`] returns the lower Cholesky factor used to draw
//!   correlated Gaussian noise.
//! - [`min_eigenvalue`] of the conditional covariance sets the default
//!   Langevin step; [`max_eigenvalue`] bounds the Lipschitz constant of a
//!   loss gradient.
//!
//! Invariants & assumptions
//! ------------------------
//! - Matrices passed to the SPD helpers are symmetric up to round-off;
//!   they are symmetrized before factorization.
//! - A failed Cholesky factorization is a hard error, and so is a
//!   factorization that only succeeded through round-off: any pivot with
//!   `L[i,i]² < n · ε · max_j A[j,j]` is rejected as singular. There is no
//!   jitter or pseudo-inverse fallback: perturbing a conditional precision
//!   would change the law being sampled.
//!
//! Conventions
//! -----------
//! - Zero-dimensional inputs are valid and produce zero-dimensional
//!   outputs, so an empty selection flows through without special cases.

pub mod errors;

pub use self::errors::{LinalgError, LinalgResult};

use nalgebra::{Cholesky, DMatrix, Dyn};
use ndarray::{Array1, Array2, ArrayView2};

/// Copy an `ndarray` matrix into a column-major `DMatrix`.
pub fn to_dmatrix(a: &ArrayView2<f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    let mut out = DMatrix::<f64>::zeros(rows, cols);
    for j in 0..cols {
        for i in 0..rows {
            out[(i, j)] = a[[i, j]];
        }
    }
    out
}

/// Copy a `DMatrix` back into an `ndarray` matrix.
pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Replace `a` with `(a + aᵀ) / 2` in place.
pub fn symmetrize(a: &mut Array2<f64>) {
    let n = a.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (a[[i, j]] + a[[j, i]]);
            a[[i, j]] = avg;
            a[[j, i]] = avg;
        }
    }
}

/// Largest absolute asymmetry `max |a_ij − a_ji|`.
pub fn max_asymmetry(a: &ArrayView2<f64>) -> f64 {
    let n = a.nrows().min(a.ncols());
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((a[[i, j]] - a[[j, i]]).abs());
        }
    }
    worst
}

fn check_square_finite(a: &ArrayView2<f64>, context: &'static str) -> LinalgResult<()> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    for ((row, col), &value) in a.indexed_iter() {
        if !value.is_finite() {
            return Err(LinalgError::NonFinite { context, row, col, value });
        }
    }
    Ok(())
}

/// spd_inverse — inverse of a symmetric positive-definite matrix.
///
/// Parameters
/// ----------
/// - `a`: square, symmetric (up to round-off), finite matrix.
/// - `context`: label used in the error if the factorization fails.
///
/// Returns
/// -------
/// The symmetric inverse `a⁻¹`.
///
/// Errors
/// ------
/// - [`LinalgError::NotSquare`] / [`LinalgError::NonFinite`] on malformed input.
/// - [`LinalgError::NotPositiveDefinite`] if Cholesky fails or `a` is
///   singular to working precision.
pub fn spd_inverse(a: &ArrayView2<f64>, context: &'static str) -> LinalgResult<Array2<f64>> {
    check_square_finite(a, context)?;
    let n = a.nrows();
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    let chol = factor_spd(a, context)?;
    let mut inv = from_dmatrix(&chol.inverse());
    symmetrize(&mut inv);
    Ok(inv)
}

/// Cholesky factor of the symmetrized `a`, refusing numerically singular
/// input.
///
/// # Errors
/// [`LinalgError::NotPositiveDefinite`] if the factorization fails or a
/// squared pivot falls below `n · ε · max_j a[j,j]`.
fn factor_spd(a: &ArrayView2<f64>, context: &'static str) -> LinalgResult<Cholesky<f64, Dyn>> {
    let n = a.nrows();
    let mut sym = a.to_owned();
    symmetrize(&mut sym);
    let scale = sym.diag().iter().copied().fold(0.0_f64, f64::max);
    let singular = LinalgError::NotPositiveDefinite { context, dim: n };
    let chol = to_dmatrix(&sym.view()).cholesky().ok_or(singular.clone())?;
    let floor = n as f64 * f64::EPSILON * scale;
    let l = chol.l_dirty();
    if (0..n).any(|i| l[(i, i)] * l[(i, i)] <= floor) {
        return Err(singular);
    }
    Ok(chol)
}

/// Lower-triangular Cholesky factor `L` with `a = L Lᵀ`.
pub fn cholesky_lower(a: &ArrayView2<f64>, context: &'static str) -> LinalgResult<Array2<f64>> {
    check_square_finite(a, context)?;
    let n = a.nrows();
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    let chol = factor_spd(a, context)?;
    Ok(from_dmatrix(&chol.l()))
}

/// Solve `a x = b` for symmetric positive-definite `a`.
pub fn spd_solve(
    a: &ArrayView2<f64>, b: &Array1<f64>, context: &'static str,
) -> LinalgResult<Array1<f64>> {
    check_square_finite(a, context)?;
    let n = a.nrows();
    if b.len() != n {
        return Err(LinalgError::DimensionMismatch { context, expected: n, found: b.len() });
    }
    if n == 0 {
        return Ok(Array1::zeros(0));
    }
    let chol = factor_spd(a, context)?;
    let rhs = nalgebra::DVector::from_iterator(n, b.iter().copied());
    let x = chol.solve(&rhs);
    Ok(Array1::from_iter(x.iter().copied()))
}

/// Largest eigenvalue of a symmetric matrix (0 for an empty matrix).
pub fn max_eigenvalue(a: &ArrayView2<f64>) -> LinalgResult<f64> {
    check_square_finite(a, "eigenvalue bound")?;
    if a.nrows() == 0 {
        return Ok(0.0);
    }
    let mut sym = a.to_owned();
    symmetrize(&mut sym);
    let eig = to_dmatrix(&sym.view()).symmetric_eigen();
    Ok(eig.eigenvalues.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Smallest eigenvalue of a symmetric matrix (0 for an empty matrix).
pub fn min_eigenvalue(a: &ArrayView2<f64>) -> LinalgResult<f64> {
    check_square_finite(a, "eigenvalue bound")?;
    if a.nrows() == 0 {
        return Ok(0.0);
    }
    let mut sym = a.to_owned();
    symmetrize(&mut sym);
    let eig = to_dmatrix(&sym.view()).symmetric_eigen();
    Ok(eig.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min))
}
