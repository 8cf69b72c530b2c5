//! optimization::proximal — accelerated proximal gradient for the
//! randomized penalized problem.
//!
//! Purpose
//! -------
//! Solve
//!
//! ```text
//! minimize  ℓ(β) + ε/2 ‖β‖² − ωᵀβ + P(β)
//! ```
//!
//! where `ℓ` is a [`SmoothLoss`], `ε ≥ 0` a ridge term, `ω` the drawn
//! perturbation and `P` a [`GroupLasso`] penalty. This is the randomized
//! program whose solution defines the selection event.
//!
//! Key behaviors
//! -------------
//! - FISTA with constant step `1 / (L + ε)`, `L = loss.lipschitz()`.
//! - Stops once at least `min_its` iterations ran and the relative change
//!   `‖β_k − β_{k−1}‖ / max(1, ‖β_k‖)` drops below `tol`.
//! - Hitting `max_its` is not an error: the last iterate is returned with
//!   `converged = false` and a `warn!` is emitted.
//!
//! Invariants & assumptions
//! ------------------------
//! - Loss, penalty and perturbation share the dimension `p`.
//! - `L + ε` is finite and positive; otherwise the step is unusable and
//!   [`OptError::InvalidStepSize`] is returned.
use log::{debug, warn};
use ndarray::{Array1, ArrayView1};

use crate::{
    optimization::errors::{OptError, OptResult},
    selection::{loss::SmoothLoss, penalty::GroupLasso},
};

/// Stopping rules for [`solve_penalized`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub min_its: usize,
    pub max_its: usize,
    pub tol: f64,
}

impl SolveOptions {
    /// # Errors
    /// - [`OptError::InvalidSolveIters`] if `max_its == 0` or
    ///   `min_its > max_its`.
    /// - [`OptError::InvalidSolveTol`] if `tol` is not finite and positive.
    pub fn new(min_its: usize, max_its: usize, tol: f64) -> OptResult<Self> {
        if max_its == 0 {
            return Err(OptError::InvalidSolveIters {
                min_its,
                max_its,
                reason: "max_its must be at least 1",
            });
        }
        if min_its > max_its {
            return Err(OptError::InvalidSolveIters {
                min_its,
                max_its,
                reason: "min_its must not exceed max_its",
            });
        }
        if !tol.is_finite() || tol <= 0.0 {
            return Err(OptError::InvalidSolveTol { tol, reason: "must be finite and positive" });
        }
        Ok(Self { min_its, max_its, tol })
    }
}

impl Default for SolveOptions {
    /// 50 / 5000 iterations, relative tolerance `1e-10`.
    fn default() -> Self {
        Self { min_its: 50, max_its: 5000, tol: 1e-10 }
    }
}

/// Result of [`solve_penalized`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProximalOutcome {
    pub beta: Array1<f64>,
    pub iterations: usize,
    pub converged: bool,
    /// Full randomized objective at `beta`.
    pub objective: f64,
}

fn smooth_value(
    loss: &dyn SmoothLoss, epsilon: f64, perturbation: &ArrayView1<f64>, beta: &Array1<f64>,
) -> f64 {
    loss.value(&beta.view()) + 0.5 * epsilon * beta.dot(beta) - perturbation.dot(beta)
}

fn smooth_gradient(
    loss: &dyn SmoothLoss, epsilon: f64, perturbation: &ArrayView1<f64>, beta: &Array1<f64>,
) -> Array1<f64> {
    loss.gradient(&beta.view()) + epsilon * beta - perturbation
}

/// solve_penalized — minimize the randomized penalized objective.
///
/// Parameters
/// ----------
/// - `loss`: smooth loss `ℓ`, dimension `p`.
/// - `penalty`: group lasso over the same `p` coordinates.
/// - `epsilon`: ridge term `ε ≥ 0`.
/// - `perturbation`: randomization `ω`, length `p`.
/// - `opts`: stopping rules.
///
/// Returns
/// -------
/// [`ProximalOutcome`] with the final iterate and its objective value.
///
/// Errors
/// ------
/// - [`OptError::DimensionMismatch`] if the shapes disagree.
/// - [`OptError::InvalidStepSize`] if `1 / (L + ε)` is not finite and
///   positive.
/// - [`OptError::NonFiniteCost`] if the objective diverges.
pub fn solve_penalized(
    loss: &dyn SmoothLoss, penalty: &GroupLasso, epsilon: f64, perturbation: &ArrayView1<f64>,
    opts: &SolveOptions,
) -> OptResult<ProximalOutcome> {
    let p = loss.dim();
    if penalty.dim() != p {
        return Err(OptError::DimensionMismatch {
            context: "penalty dimension",
            expected: p,
            found: penalty.dim(),
        });
    }
    if perturbation.len() != p {
        return Err(OptError::DimensionMismatch {
            context: "perturbation length",
            expected: p,
            found: perturbation.len(),
        });
    }
    let step = 1.0 / (loss.lipschitz() + epsilon);
    if !step.is_finite() || step <= 0.0 {
        return Err(OptError::InvalidStepSize { step });
    }

    let mut current = Array1::<f64>::zeros(p);
    let mut momentum = current.clone();
    let mut t = 1.0_f64;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_its {
        iterations += 1;
        let grad = smooth_gradient(loss, epsilon, perturbation, &momentum);
        let next = penalty.prox(&(&momentum - &(step * &grad)).view(), step);

        let t_next = 0.5 * (1.0 + (1.0 + 4.0 * t * t).sqrt());
        let delta = &next - &current;
        momentum = &next + &(((t - 1.0) / t_next) * &delta);

        let change = delta.dot(&delta).sqrt() / next.dot(&next).sqrt().max(1.0);
        current = next;
        t = t_next;

        if iterations >= opts.min_its && change < opts.tol {
            converged = true;
            break;
        }
    }

    let objective =
        smooth_value(loss, epsilon, perturbation, &current) + penalty.value(&current.view());
    if !objective.is_finite() {
        return Err(OptError::NonFiniteCost { value: objective });
    }
    if converged {
        debug!("proximal solver converged after {iterations} iterations, objective {objective}");
    } else {
        warn!("proximal solver stopped at the iteration cap ({iterations}) without converging");
    }

    Ok(ProximalOutcome { beta: current, iterations, converged, objective })
}
