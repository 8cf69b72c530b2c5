//! inference::intervals — selective pivots and confidence intervals.
//!
//! Purpose
//! -------
//! Turn a sample of the optimization state, drawn at the observed score,
//! into inference for a linear functional `η = lᵀ θ` of a [`Target`]. The
//! conditional law of `lᵀ T̂` given the selection is approximated by
//! importance reweighting: Gaussian draws of the statistic are paired with
//! the optimization draws and weighted by the randomizer density ratio
//! between the score they imply and the observed score.
//!
//! Key behaviors
//! -------------
//! - For direction `l` with `v = lᵀ Σ_T l`, the score moves along
//!   `τ = Σ_{T,s}ᵀ l / v` while the nuisance part
//!   `s_obs − τ · lᵀ T̂_obs` stays fixed.
//! - [`OptimizationIntervals::pivot`] returns the weighted probability
//!   `P_η(lᵀ T̂ ≤ lᵀ T̂_obs | selection)`, mapped through the alternative.
//! - [`OptimizationIntervals::confidence_interval`] inverts the pivot with
//!   argmin's `BrentRoot` over `lᵀ T̂_obs ± 20 √v`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The normal sample is drawn once, at construction, with as many rows as
//!   the optimization sample; pivots at different candidates share it, so
//!   the pivot is monotone in the candidate for a fixed object.
//! - Log-weights are shifted by their maximum before exponentiation.
//!
//! Testing notes
//! -------------
//! - With a negligible threshold the selection is almost sure and the
//!   interval for a unit-variance target approaches `Z ± z_{(1+α)/2}`.
use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::brent::BrentRoot;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::{
    inference::{
        errors::{InferenceError, InferenceResult},
        targets::{Alternative, Target},
    },
    linalg::cholesky_lower,
    sampling::{affine_gaussian::AffineGaussianSampler, log_density::LogDensity},
};

const BRACKET_SDS: f64 = 20.0;
const ROOT_TOL: f64 = 1e-6;
const ROOT_MAX_ITERS: u64 = 200;

/// Importance-sampling machinery for one sampler, sample and target.
#[derive(Debug)]
pub struct OptimizationIntervals<'a, D: LogDensity> {
    sampler: &'a AffineGaussianSampler<D>,
    opt_sample: Array2<f64>,
    target: &'a Target,
    normal_sample: Array2<f64>,
    reference: Array1<f64>,
}

impl<'a, D: LogDensity> OptimizationIntervals<'a, D> {
    /// Parameters
    /// ----------
    /// - `sampler`: sampler whose chain produced `opt_sample`.
    /// - `opt_sample`: `n × d` optimization draws at the observed score.
    /// - `target`: target whose cross-covariance is against that score.
    /// - `rng`: source of the `n × k` Gaussian sample of the statistic.
    ///
    /// Errors
    /// ------
    /// - [`InferenceError::EmptySample`] if `opt_sample` has no rows.
    /// - [`InferenceError::DimensionMismatch`] if the sample or target do
    ///   not match the sampler.
    /// - [`InferenceError::Linalg`] if the target covariance is not SPD.
    pub fn new<R: Rng + ?Sized>(
        sampler: &'a AffineGaussianSampler<D>, opt_sample: Array2<f64>, target: &'a Target,
        rng: &mut R,
    ) -> InferenceResult<Self> {
        if opt_sample.nrows() == 0 {
            return Err(InferenceError::EmptySample);
        }
        let density = sampler.density();
        for (context, expected, found) in [
            ("optimization sample columns", density.opt_dim(), opt_sample.ncols()),
            ("target cross-covariance columns", density.score_dim(), target.crosscov.ncols()),
        ] {
            if found != expected {
                return Err(InferenceError::DimensionMismatch { context, expected, found });
            }
        }

        let chol = cholesky_lower(&target.covariance.view(), "target covariance")?;
        let standard = Array2::from_shape_fn((opt_sample.nrows(), target.dim()), |_| {
            rng.sample::<f64, _>(StandardNormal)
        });
        let normal_sample = standard.dot(&chol.t());

        let score = sampler.observed_score_state().view();
        let mut reference = Array1::<f64>::zeros(opt_sample.nrows());
        for (slot, draw) in reference.iter_mut().zip(opt_sample.rows()) {
            *slot = density.log_density(&score, &draw)?;
        }

        Ok(Self { sampler, opt_sample, target, normal_sample, reference })
    }

    pub fn opt_sample(&self) -> &Array2<f64> {
        &self.opt_sample
    }

    pub fn normal_sample(&self) -> &Array2<f64> {
        &self.normal_sample
    }

    /// pivot — selective tail probability of `lᵀ T̂` at `candidate`.
    ///
    /// Returns
    /// -------
    /// - `Less`: `p = P_η(lᵀ T̂ ≤ observed)`.
    /// - `Greater`: `1 − p`.
    /// - `TwoSided`: `2 · min(p, 1 − p)`.
    ///
    /// Errors
    /// ------
    /// - [`InferenceError::DimensionMismatch`] if `direction` is not of
    ///   length `k`.
    /// - [`InferenceError::DegenerateDirection`] if `lᵀ Σ_T l ≤ 0`.
    /// - [`InferenceError::DegenerateWeights`] if no draw carries weight.
    pub fn pivot(
        &self, direction: &ArrayView1<f64>, candidate: f64, alternative: Alternative,
    ) -> InferenceResult<f64> {
        let p = self.lower_tail(direction, candidate)?;
        Ok(match alternative {
            Alternative::Less => p,
            Alternative::Greater => 1.0 - p,
            Alternative::TwoSided => 2.0 * p.min(1.0 - p),
        })
    }

    /// confidence_interval — invert the pivot at `level`.
    ///
    /// The lower end solves `p(η) = (1 + level) / 2` and the upper end
    /// `p(η) = (1 − level) / 2`, where `p` is the `Less` pivot.
    ///
    /// Errors
    /// ------
    /// - [`InferenceError::InvalidLevel`] unless `0 < level < 1`.
    /// - [`InferenceError::RootFinding`] if the pivot does not cross the
    ///   required value inside the bracket.
    /// - Errors from [`pivot`](Self::pivot).
    pub fn confidence_interval(
        &self, direction: &ArrayView1<f64>, level: f64,
    ) -> InferenceResult<(f64, f64)> {
        if level.is_nan() || level <= 0.0 || level >= 1.0 {
            return Err(InferenceError::InvalidLevel { level });
        }
        let (_, variance) = self.direction_moments(direction)?;
        let observed = direction.dot(&self.target.observed);
        let sd = variance.sqrt();
        let bracket = (observed - BRACKET_SDS * sd, observed + BRACKET_SDS * sd);

        let lower = self.solve_pivot(direction, (1.0 + level) / 2.0, bracket, sd)?;
        let upper = self.solve_pivot(direction, (1.0 - level) / 2.0, bracket, sd)?;
        debug!("Selective interval at level {level}: [{lower}, {upper}] around {observed}");
        Ok((lower, upper))
    }

    fn solve_pivot(
        &self, direction: &ArrayView1<f64>, value: f64, bracket: (f64, f64), sd: f64,
    ) -> InferenceResult<f64> {
        let problem = PivotRoot { intervals: self, direction: direction.view(), value };
        let solver = BrentRoot::new(bracket.0, bracket.1, ROOT_TOL * sd);
        let res =
            Executor::new(problem, solver).configure(|s| s.max_iters(ROOT_MAX_ITERS)).run()?;
        res.state().get_param().copied().ok_or_else(|| {
            InferenceError::RootFinding("BrentRoot returned no parameter".to_string())
        })
    }

    /// Returns `(τ, v)` for direction `l`.
    fn direction_moments(
        &self, direction: &ArrayView1<f64>,
    ) -> InferenceResult<(Array1<f64>, f64)> {
        let k = self.target.dim();
        if direction.len() != k {
            return Err(InferenceError::DimensionMismatch {
                context: "pivot direction",
                expected: k,
                found: direction.len(),
            });
        }
        let variance = direction.dot(&self.target.covariance.dot(direction));
        if variance.is_nan() || variance <= 0.0 {
            return Err(InferenceError::DegenerateDirection { variance });
        }
        let translate = self.target.crosscov.t().dot(direction) / variance;
        Ok((translate, variance))
    }

    fn lower_tail(&self, direction: &ArrayView1<f64>, candidate: f64) -> InferenceResult<f64> {
        let (translate, _) = self.direction_moments(direction)?;
        let observed = direction.dot(&self.target.observed);
        let nuisance = self.sampler.observed_score_state() - &(&translate * observed);
        let stats = self.normal_sample.dot(direction) + candidate;

        let density = self.sampler.density();
        let mut log_weights = Array1::<f64>::zeros(stats.len());
        for (i, draw) in self.opt_sample.rows().into_iter().enumerate() {
            let score = &nuisance + &(&translate * stats[i]);
            log_weights[i] = density.log_density(&score.view(), &draw)? - self.reference[i];
        }

        let max = log_weights.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(InferenceError::DegenerateWeights);
        }
        let (mut below, mut total) = (0.0, 0.0);
        for (&lw, &stat) in log_weights.iter().zip(stats.iter()) {
            let w = (lw - max).exp();
            total += w;
            if stat <= observed {
                below += w;
            }
        }
        Ok(below / total)
    }
}

/// Pivot minus a target probability, as a root-finding problem.
struct PivotRoot<'a, 'b, D: LogDensity> {
    intervals: &'b OptimizationIntervals<'a, D>,
    direction: ArrayView1<'b, f64>,
    value: f64,
}

impl<D: LogDensity> CostFunction for PivotRoot<'_, '_, D> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, candidate: &f64) -> Result<f64, Error> {
        let p = self.intervals.pivot(&self.direction, *candidate, Alternative::Less)?;
        Ok(p - self.value)
    }
}
