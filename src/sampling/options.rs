//! sampling::options — chain length, burn-in, thinning and step size.
use crate::sampling::errors::{SamplerError, SamplerResult};

/// Configuration for a projected-Langevin run.
///
/// Default:
/// - `ndraw`: 2000 retained draws
/// - `burnin`: 500 discarded steps
/// - `thin`: 1 (keep every step)
/// - `step_size`: `None`, i.e. `0.1 / λ_max(K)` for conditional precision `K`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerOptions {
    pub ndraw: usize,
    pub burnin: usize,
    pub thin: usize,
    pub step_size: Option<f64>,
}

impl SamplerOptions {
    /// # Errors
    /// [`SamplerError::InvalidOptions`] if `ndraw == 0`, `thin == 0`, or a
    /// given step size is not finite and positive.
    pub fn new(
        ndraw: usize, burnin: usize, thin: usize, step_size: Option<f64>,
    ) -> SamplerResult<Self> {
        if ndraw == 0 {
            return Err(SamplerError::InvalidOptions {
                field: "ndraw",
                reason: "at least one draw is required",
            });
        }
        if thin == 0 {
            return Err(SamplerError::InvalidOptions { field: "thin", reason: "must be >= 1" });
        }
        if let Some(step) = step_size {
            if !step.is_finite() || step <= 0.0 {
                return Err(SamplerError::InvalidOptions {
                    field: "step_size",
                    reason: "must be finite and positive",
                });
            }
        }
        Ok(Self { ndraw, burnin, thin, step_size })
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self { ndraw: 2000, burnin: 500, thin: 1, step_size: None }
    }
}
