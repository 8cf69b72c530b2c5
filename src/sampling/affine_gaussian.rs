//! sampling::affine_gaussian — conditional sampler for a fitted selection.
//!
//! Purpose
//! -------
//! Bundle everything needed to draw the optimization state given the
//! observed score and the selection event: the log-density over
//! `(score, opt)` pairs, the feasible region with its projection, and the
//! affine constraints with the conditional Gaussian law.
//!
//! Key behaviors
//! -------------
//! - [`AffineGaussianSampler::sample`] runs a [`ProjectedLangevin`] chain
//!   from the observed optimization state, discards `burnin` steps and keeps
//!   every `thin`-th state until `ndraw` draws are collected.
//! - [`AffineGaussianSampler::sample_transformed`] maps each draw through
//!   an [`AffineTransform`] into a target space.
//! - [`AffineGaussianSampler::coefficient_pvalues`] and
//!   [`AffineGaussianSampler::confidence_intervals`] run
//!   [`OptimizationIntervals`] over every coordinate of a [`Target`].
//!
//! Conventions
//! -----------
//! - Draws are rows: an `ndraw × d` matrix.
//! - The automatic step size is `0.1 · λ_min(Σ_cond) = 0.1 / λ_max(K)`.
use log::debug;
use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;

use crate::{
    constraints::AffineConstraints,
    inference::{
        errors::{InferenceError, InferenceResult},
        intervals::OptimizationIntervals,
        targets::Target,
    },
    linalg::min_eigenvalue,
    sampling::{
        errors::{SamplerError, SamplerResult},
        langevin::ProjectedLangevin,
        log_density::{GaussianLogDensity, LogDensity},
        options::SamplerOptions,
    },
    selection::{decomposition::AffineTransform, query::FeasibleRegion},
};

const DEFAULT_STEP_FACTOR: f64 = 0.1;

/// Sampler for the optimization state of a fitted selection.
#[derive(Debug, Clone)]
pub struct AffineGaussianSampler<D: LogDensity = GaussianLogDensity> {
    density: D,
    region: FeasibleRegion,
    constraints: AffineConstraints,
    observed_opt_state: Array1<f64>,
    observed_score_state: Array1<f64>,
    default_step: f64,
}

impl<D: LogDensity> AffineGaussianSampler<D> {
    /// Assemble a sampler and derive its automatic step size.
    ///
    /// # Errors
    /// - [`SamplerError::DimensionMismatch`] if the pieces disagree on the
    ///   optimization or score dimension.
    /// - [`SamplerError::Linalg`] if the conditional covariance has
    ///   non-finite entries.
    pub fn new(
        density: D, region: FeasibleRegion, constraints: AffineConstraints,
        observed_opt_state: Array1<f64>, observed_score_state: Array1<f64>,
    ) -> SamplerResult<Self> {
        let d = density.opt_dim();
        for (context, found) in [
            ("sampler region", region.dim()),
            ("sampler constraints", constraints.dim()),
            ("sampler observed opt state", observed_opt_state.len()),
        ] {
            if found != d {
                return Err(SamplerError::DimensionMismatch { context, expected: d, found });
            }
        }
        if observed_score_state.len() != density.score_dim() {
            return Err(SamplerError::DimensionMismatch {
                context: "sampler observed score state",
                expected: density.score_dim(),
                found: observed_score_state.len(),
            });
        }
        let min_var = min_eigenvalue(&constraints.covariance().view())?;
        let default_step = if d > 0 && min_var > 0.0 { DEFAULT_STEP_FACTOR * min_var } else { 1.0 };
        Ok(Self {
            density,
            region,
            constraints,
            observed_opt_state,
            observed_score_state,
            default_step,
        })
    }

    pub fn density(&self) -> &D {
        &self.density
    }

    pub fn region(&self) -> &FeasibleRegion {
        &self.region
    }

    pub fn constraints(&self) -> &AffineConstraints {
        &self.constraints
    }

    pub fn observed_opt_state(&self) -> &Array1<f64> {
        &self.observed_opt_state
    }

    pub fn observed_score_state(&self) -> &Array1<f64> {
        &self.observed_score_state
    }

    /// Step size used when [`SamplerOptions::step_size`] is `None`.
    pub fn default_step(&self) -> f64 {
        self.default_step
    }

    /// sample — projected-Langevin draws of the optimization state.
    ///
    /// Returns
    /// -------
    /// `ndraw × d` matrix of retained chain states.
    ///
    /// Errors
    /// ------
    /// - [`SamplerError::InvalidOptions`] for an unusable step size.
    /// - [`SamplerError::StepSizeCollapsed`] if the chain cannot move.
    pub fn sample<R: Rng + ?Sized>(
        &self, opts: &SamplerOptions, rng: &mut R,
    ) -> SamplerResult<Array2<f64>> {
        let step = opts.step_size.unwrap_or(self.default_step);
        let mut chain = ProjectedLangevin::new(
            &self.density,
            &self.region,
            self.observed_score_state.view(),
            &self.observed_opt_state.view(),
            step,
        )?;
        for _ in 0..opts.burnin {
            chain.step(rng)?;
        }
        let mut draws = Array2::<f64>::zeros((opts.ndraw, self.region.dim()));
        for mut row in draws.rows_mut() {
            for _ in 0..opts.thin {
                chain.step(rng)?;
            }
            row.assign(chain.state());
        }
        debug!(
            "Langevin sampler: {} draws after {} burn-in steps (thin {}, final step {})",
            opts.ndraw,
            opts.burnin,
            opts.thin,
            chain.step_size()
        );
        Ok(draws)
    }

    /// Draws mapped through `transform`, one row per draw.
    ///
    /// # Errors
    /// As [`sample`](Self::sample), plus [`SamplerError::Selection`] if
    /// `transform` does not accept the optimization state.
    pub fn sample_transformed<R: Rng + ?Sized>(
        &self, transform: &AffineTransform, opts: &SamplerOptions, rng: &mut R,
    ) -> SamplerResult<Array2<f64>> {
        let draws = self.sample(opts, rng)?;
        let mut out = Array2::<f64>::zeros((draws.nrows(), transform.output_dim()));
        for (draw, mut row) in draws.rows().into_iter().zip(out.rows_mut()) {
            row.assign(&transform.apply(&draw)?);
        }
        Ok(out)
    }

    /// coefficient_pvalues — selective p-value for every target coordinate.
    ///
    /// Parameters
    /// ----------
    /// - `opt_sample`: draws from [`sample`](Self::sample).
    /// - `target`: target with one alternative per coordinate.
    /// - `null_value`: hypothesized value per coordinate; zeros if `None`.
    ///
    /// Errors
    /// ------
    /// Errors from [`OptimizationIntervals`].
    pub fn coefficient_pvalues<R: Rng + ?Sized>(
        &self, opt_sample: &ArrayView2<f64>, target: &Target, null_value: Option<&Array1<f64>>,
        rng: &mut R,
    ) -> InferenceResult<Array1<f64>> {
        let k = target.dim();
        let null_value = match null_value {
            Some(v) if v.len() != k => {
                return Err(InferenceError::DimensionMismatch {
                    context: "null values",
                    expected: k,
                    found: v.len(),
                });
            }
            Some(v) => v.clone(),
            None => Array1::zeros(k),
        };
        let intervals = OptimizationIntervals::new(self, opt_sample.to_owned(), target, rng)?;
        let mut pvalues = Array1::<f64>::zeros(k);
        for j in 0..k {
            let mut direction = Array1::<f64>::zeros(k);
            direction[j] = 1.0;
            pvalues[j] =
                intervals.pivot(&direction.view(), null_value[j], target.alternatives[j])?;
        }
        Ok(pvalues)
    }

    /// Selective confidence interval at `level` for every target coordinate.
    ///
    /// # Errors
    /// Errors from [`OptimizationIntervals`].
    pub fn confidence_intervals<R: Rng + ?Sized>(
        &self, opt_sample: &ArrayView2<f64>, target: &Target, level: f64, rng: &mut R,
    ) -> InferenceResult<Vec<(f64, f64)>> {
        let k = target.dim();
        let intervals = OptimizationIntervals::new(self, opt_sample.to_owned(), target, rng)?;
        (0..k)
            .map(|j| {
                let mut direction = Array1::<f64>::zeros(k);
                direction[j] = 1.0;
                intervals.confidence_interval(&direction.view(), level)
            })
            .collect()
    }
}
