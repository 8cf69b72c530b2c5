//! sampling::log_density — log-density of `(score, opt)` pairs.
//!
//! The selective law of the optimization state `o` given the score `s` is
//! the randomizer density evaluated at the reconstructed perturbation
//! `ω(s, o)`, restricted to the feasible region. [`LogDensity`] is the
//! functional the Langevin chain climbs; [`GaussianLogDensity`] implements
//! it for a Gaussian randomizer with precision `Q`:
//!
//! ```text
//! log g(s, o) = −½ ω(s, o)ᵀ Q ω(s, o),   ∇_o log g = −Lᵀ Q ω(s, o)
//! ```
//!
//! The full quadratic form is kept, including the part that depends on `s`
//! alone, so density ratios across different scores are exact.
use ndarray::{Array1, ArrayView1};

use crate::{
    randomization::RandomizerPrecision,
    sampling::errors::{SamplerError, SamplerResult},
    selection::decomposition::LinearDecomposition,
};

/// Unnormalized log-density over `(score, opt)` pairs.
pub trait LogDensity {
    /// Dimension of the optimization state.
    fn opt_dim(&self) -> usize;

    /// Dimension of the score state.
    fn score_dim(&self) -> usize;

    fn log_density(
        &self, score_state: &ArrayView1<f64>, opt_state: &ArrayView1<f64>,
    ) -> SamplerResult<f64>;

    /// Gradient with respect to the optimization state.
    fn grad_opt(
        &self, score_state: &ArrayView1<f64>, opt_state: &ArrayView1<f64>,
    ) -> SamplerResult<Array1<f64>>;
}

/// Gaussian randomizer density pulled back through a decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianLogDensity {
    decomposition: LinearDecomposition,
    precision: RandomizerPrecision,
}

impl GaussianLogDensity {
    /// # Errors
    /// [`SamplerError::DimensionMismatch`] if a dense precision does not
    /// match the randomization dimension of `decomposition`.
    pub fn new(
        decomposition: LinearDecomposition, precision: RandomizerPrecision,
    ) -> SamplerResult<Self> {
        if let Some(d) = precision.dim() {
            if d != decomposition.dim() {
                return Err(SamplerError::DimensionMismatch {
                    context: "log-density precision",
                    expected: decomposition.dim(),
                    found: d,
                });
            }
        }
        Ok(Self { decomposition, precision })
    }

    pub fn decomposition(&self) -> &LinearDecomposition {
        &self.decomposition
    }

    pub fn precision(&self) -> &RandomizerPrecision {
        &self.precision
    }
}

impl LogDensity for GaussianLogDensity {
    fn opt_dim(&self) -> usize {
        self.decomposition.opt.input_dim()
    }

    fn score_dim(&self) -> usize {
        self.decomposition.score.input_dim()
    }

    fn log_density(
        &self, score_state: &ArrayView1<f64>, opt_state: &ArrayView1<f64>,
    ) -> SamplerResult<f64> {
        let omega = self.decomposition.reconstruct(opt_state, score_state)?;
        Ok(-0.5 * self.precision.quadratic(&omega.view())?)
    }

    fn grad_opt(
        &self, score_state: &ArrayView1<f64>, opt_state: &ArrayView1<f64>,
    ) -> SamplerResult<Array1<f64>> {
        let omega = self.decomposition.reconstruct(opt_state, score_state)?;
        let q_omega = self.precision.apply(&omega.view())?;
        Ok(-self.decomposition.opt.linear.t().dot(&q_omega))
    }
}
