//! adjusted_mle::barrier — barrier-smoothed quadratic over the positive orthant.
//!
//! Purpose
//! -------
//! Minimize
//!
//! ```text
//! f(u) = −uᵀc + ½ uᵀ P u + Σᵢ log(1 + sᵢ / uᵢ),   sᵢ = √Pᵢᵢ,   u > 0
//! ```
//!
//! which is the Laplace-type approximation to the log normalizing constant
//! of a Gaussian truncated to the nonnegative orthant. The log term blows
//! up at the boundary, so the minimizer is interior and `f` is strictly
//! convex there.
//!
//! Key behaviors
//! -------------
//! - Damped Newton: the direction solves `∇²f(u) Δ = ∇f(u)`, and the step
//!   is halved until the proposal stays positive and then until it does not
//!   increase `f`.
//! - Stops when the decrease is below `tol · |f|`; every fourth iteration
//!   the step grows back toward 1.
//! - Returns the inverse Hessian at the solution, which is what the MLE
//!   Jacobian needs.
//!
//! Invariants & assumptions
//! ------------------------
//! - `P` is symmetric positive definite with positive diagonal.
//! - The starting point is strictly positive; it need not be close to the
//!   optimum.
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{
    adjusted_mle::errors::{MleError, MleResult},
    linalg::{LinalgError, spd_inverse, spd_solve},
};

/// Configuration for [`solve_barrier_nonneg`].
///
/// Default:
/// - `max_iter`: 1000 Newton iterations
/// - `tol`: 1e-12 relative decrease
/// - `max_backtrack`: 60 halvings per line search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierOptions {
    pub max_iter: usize,
    pub tol: f64,
    pub max_backtrack: usize,
}

impl BarrierOptions {
    /// # Errors
    /// [`MleError::InvalidOptions`] if an iteration count is zero or `tol`
    /// is not finite and positive.
    pub fn new(max_iter: usize, tol: f64, max_backtrack: usize) -> MleResult<Self> {
        if max_iter == 0 {
            return Err(MleError::InvalidOptions { field: "max_iter", reason: "must be >= 1" });
        }
        if !tol.is_finite() || tol <= 0.0 {
            return Err(MleError::InvalidOptions {
                field: "tol",
                reason: "must be finite and positive",
            });
        }
        if max_backtrack == 0 {
            return Err(MleError::InvalidOptions {
                field: "max_backtrack",
                reason: "must be >= 1",
            });
        }
        Ok(Self { max_iter, tol, max_backtrack })
    }
}

impl Default for BarrierOptions {
    fn default() -> Self {
        Self { max_iter: 1000, tol: 1e-12, max_backtrack: 60 }
    }
}

/// Minimizer of the barrier objective together with its curvature.
#[derive(Debug, Clone, PartialEq)]
pub struct BarrierSolution {
    pub solution: Array1<f64>,
    pub value: f64,
    /// `(P + diag b''(u*))⁻¹`.
    pub hessian_inverse: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// solve_barrier_nonneg — minimize the barrier objective over `u > 0`.
///
/// Parameters
/// ----------
/// - `conjugate_arg`: linear coefficient `c`, length `d`.
/// - `precision`: `d × d` SPD matrix `P`.
/// - `feasible_point`: strictly positive start, length `d`.
/// - `opts`: iteration and backtracking limits.
///
/// Returns
/// -------
/// [`BarrierSolution`]. Hitting `max_iter` is not an error; it is logged
/// with `warn!` and reported through `converged = false`.
///
/// Errors
/// ------
/// - [`MleError::DimensionMismatch`] for non-conformable inputs.
/// - [`MleError::InfeasibleStart`] if a start coordinate is not positive.
/// - [`MleError::NoFeasibleStep`] if halving never restores positivity.
/// - [`MleError::NonFiniteValue`] if the objective is not finite at the
///   start.
/// - [`MleError::Linalg`] if `P` has a non-positive diagonal or the
///   Hessian cannot be factorized.
pub fn solve_barrier_nonneg(
    conjugate_arg: &ArrayView1<f64>, precision: &ArrayView2<f64>,
    feasible_point: &ArrayView1<f64>, opts: &BarrierOptions,
) -> MleResult<BarrierSolution> {
    let d = conjugate_arg.len();
    for (context, found) in [
        ("barrier precision rows", precision.nrows()),
        ("barrier precision cols", precision.ncols()),
        ("barrier feasible point", feasible_point.len()),
    ] {
        if found != d {
            return Err(MleError::DimensionMismatch { context, expected: d, found });
        }
    }
    if let Some((index, &value)) = feasible_point.iter().enumerate().find(|(_, v)| **v <= 0.0) {
        return Err(MleError::InfeasibleStart { index, value });
    }
    if precision.diag().iter().any(|&p| p <= 0.0 || !p.is_finite()) {
        let err = LinalgError::NotPositiveDefinite { context: "barrier precision", dim: d };
        return Err(err.into());
    }
    if d == 0 {
        return Ok(BarrierSolution {
            solution: Array1::zeros(0),
            value: 0.0,
            hessian_inverse: Array2::zeros((0, 0)),
            iterations: 0,
            converged: true,
        });
    }

    let problem = Barrier {
        c: conjugate_arg.view(),
        p: precision.view(),
        s: precision.diag().mapv(f64::sqrt),
    };
    let mut u = feasible_point.to_owned();
    let mut value = problem.value(&u);
    if !value.is_finite() {
        return Err(MleError::NonFiniteValue { value });
    }

    let mut step = 1.0_f64;
    let mut converged = false;
    let mut iterations = 0;
    for iter in 0..opts.max_iter {
        iterations = iter + 1;
        let grad = problem.gradient(&u);
        let direction = spd_solve(&problem.hessian(&u).view(), &grad, "barrier Hessian")?;

        let mut halvings = 0;
        while (&u - &(&direction * step)).iter().any(|&v| v <= 0.0) {
            step *= 0.5;
            halvings += 1;
            if halvings > opts.max_backtrack {
                return Err(MleError::NoFeasibleStep { iteration: iter });
            }
        }

        let mut accepted = None;
        for _ in 0..=opts.max_backtrack {
            let proposal = &u - &(&direction * step);
            let proposed = problem.value(&proposal);
            if proposed <= value {
                accepted = Some((proposal, proposed));
                break;
            }
            step *= 0.5;
        }
        let Some((proposal, proposed)) = accepted else {
            // No descent left at machine precision.
            converged = true;
            break;
        };

        let decrease = value - proposed;
        u = proposal;
        value = proposed;
        if decrease.abs() < opts.tol * value.abs() {
            converged = true;
            break;
        }
        if iter % 4 == 0 {
            step = (2.0 * step).min(1.0);
        }
    }

    if converged {
        debug!("Barrier solver converged in {iterations} iterations (value {value})");
    } else {
        warn!("Barrier solver stopped at max_iter = {} (value {value})", opts.max_iter);
    }
    let hessian_inverse = spd_inverse(&problem.hessian(&u).view(), "barrier Hessian")?;
    Ok(BarrierSolution { solution: u, value, hessian_inverse, iterations, converged })
}

struct Barrier<'a> {
    c: ArrayView1<'a, f64>,
    p: ArrayView2<'a, f64>,
    s: Array1<f64>,
}

impl Barrier<'_> {
    fn value(&self, u: &Array1<f64>) -> f64 {
        let barrier: f64 = u.iter().zip(self.s.iter()).map(|(&ui, &si)| (1.0 + si / ui).ln()).sum();
        -u.dot(&self.c) + 0.5 * u.dot(&self.p.dot(u)) + barrier
    }

    fn gradient(&self, u: &Array1<f64>) -> Array1<f64> {
        let mut grad = self.p.dot(u) - &self.c;
        for ((g, &ui), &si) in grad.iter_mut().zip(u.iter()).zip(self.s.iter()) {
            *g -= si / (ui * (ui + si));
        }
        grad
    }

    fn hessian(&self, u: &Array1<f64>) -> Array2<f64> {
        let mut hess = self.p.to_owned();
        for (i, (&ui, &si)) in u.iter().zip(self.s.iter()).enumerate() {
            hess[[i, i]] += si * (2.0 * ui + si) / (ui * ui * (ui + si) * (ui + si));
        }
        hess
    }
}
