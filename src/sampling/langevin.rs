//! sampling::langevin — projected Langevin chain.
//!
//! Purpose
//! -------
//! Draw approximately from a log-concave density restricted to a convex
//! feasible region. Each step proposes
//!
//! ```text
//! x' = x + h ∇log π(x) + √(2h) ξ,   ξ ~ N(0, I)
//! ```
//!
//! and projects `x'` back onto the region.
//!
//! Invariants & assumptions
//! ------------------------
//! - The state is always feasible: the initial point is projected on
//!   construction and every accepted proposal is projected.
//! - If the gradient or the proposal is non-finite, the step size is
//!   halved and the step retried; below `1e-12 · h₀` the chain gives up
//!   with [`SamplerError::StepSizeCollapsed`].
use log::trace;
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::{
    sampling::{
        errors::{SamplerError, SamplerResult},
        log_density::LogDensity,
    },
    selection::query::FeasibleRegion,
};

const MIN_STEP_RATIO: f64 = 1e-12;

/// Projected Langevin chain over the optimization state at a fixed score.
#[derive(Debug)]
pub struct ProjectedLangevin<'a, D: LogDensity> {
    density: &'a D,
    region: &'a FeasibleRegion,
    score_state: ArrayView1<'a, f64>,
    state: Array1<f64>,
    step_size: f64,
    min_step: f64,
}

impl<'a, D: LogDensity> ProjectedLangevin<'a, D> {
    /// # Errors
    /// - [`SamplerError::DimensionMismatch`] if the density, region, score
    ///   and initial state disagree.
    /// - [`SamplerError::InvalidOptions`] for a non-positive step size.
    pub fn new(
        density: &'a D, region: &'a FeasibleRegion, score_state: ArrayView1<'a, f64>,
        initial: &ArrayView1<f64>, step_size: f64,
    ) -> SamplerResult<Self> {
        let d = density.opt_dim();
        for (context, found) in
            [("Langevin region", region.dim()), ("Langevin initial state", initial.len())]
        {
            if found != d {
                return Err(SamplerError::DimensionMismatch { context, expected: d, found });
            }
        }
        if score_state.len() != density.score_dim() {
            return Err(SamplerError::DimensionMismatch {
                context: "Langevin score state",
                expected: density.score_dim(),
                found: score_state.len(),
            });
        }
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(SamplerError::InvalidOptions {
                field: "step_size",
                reason: "must be finite and positive",
            });
        }
        Ok(Self {
            density,
            region,
            score_state,
            state: region.project(initial),
            step_size,
            min_step: MIN_STEP_RATIO * step_size,
        })
    }

    pub fn state(&self) -> &Array1<f64> {
        &self.state
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Advance the chain by one projected step.
    ///
    /// # Errors
    /// - [`SamplerError::StepSizeCollapsed`] if no finite proposal is found.
    /// - Errors from the log-density gradient.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SamplerResult<()> {
        let d = self.state.len();
        loop {
            let grad = self.density.grad_opt(&self.score_state, &self.state.view())?;
            let noise_scale = (2.0 * self.step_size).sqrt();
            let proposal = Array1::from_shape_fn(d, |i| {
                self.state[i]
                    + self.step_size * grad[i]
                    + noise_scale * rng.sample::<f64, _>(StandardNormal)
            });
            if proposal.iter().all(|v| v.is_finite()) {
                self.state = self.region.project(&proposal.view());
                return Ok(());
            }
            self.step_size *= 0.5;
            trace!("Langevin proposal not finite; step size halved to {}", self.step_size);
            if self.step_size < self.min_step {
                return Err(SamplerError::StepSizeCollapsed { step: self.step_size });
            }
        }
    }
}
