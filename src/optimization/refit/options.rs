//! Stopping rules and solver choices for the refit.
use std::str::FromStr;

use crate::optimization::errors::{OptError, OptResult};

/// L-BFGS history used when [`RefitOptions::lbfgs_mem`] is `None`.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Line search inside L-BFGS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearch {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearch {
    type Err = OptError;

    /// Case-insensitive; `-` and `_` are ignored, so `"hager-zhang"` parses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace(['-', '_'], "").to_lowercase().as_str() {
            "morethuente" => Ok(LineSearch::MoreThuente),
            "hagerzhang" => Ok(LineSearch::HagerZhang),
            _ => Err(OptError::UnknownLineSearch { name: s.to_string() }),
        }
    }
}

/// Stopping rules. A `None` rule is left at argmin's default (tolerances)
/// or unbounded (iterations).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Stop once `‖∇f‖` falls below this.
    pub grad: Option<f64>,
    /// Stop once the change in `f` falls below this.
    pub cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// # Errors
    /// - [`OptError::NoStoppingRule`] if every rule is `None`.
    /// - [`OptError::InvalidTolerance`] for a tolerance that is not finite
    ///   and positive.
    /// - [`OptError::InvalidMaxIter`] for a zero iteration cap.
    pub fn new(grad: Option<f64>, cost: Option<f64>, max_iter: Option<usize>) -> OptResult<Self> {
        if grad.is_none() && cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoStoppingRule);
        }
        for (name, tol) in [("gradient", grad), ("cost", cost)] {
            if let Some(value) = tol {
                if !value.is_finite() || value <= 0.0 {
                    return Err(OptError::InvalidTolerance { name, value });
                }
            }
        }
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter { max_iter: 0 });
        }
        Ok(Self { grad, cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { grad: Some(1e-8), cost: Some(1e-14), max_iter: Some(5000) }
    }
}

/// Configuration of one refit.
///
/// Default: [`Tolerances::default`], More–Thuente, quiet, memory
/// [`DEFAULT_LBFGS_MEM`].
#[derive(Debug, Clone, PartialEq)]
pub struct RefitOptions {
    pub tols: Tolerances,
    pub line_search: LineSearch,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl RefitOptions {
    /// # Errors
    /// [`OptError::InvalidMemory`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_search: LineSearch, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidMemory { mem: 0 });
        }
        Ok(Self { tols, line_search, verbose, lbfgs_mem })
    }

    pub fn memory(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }
}

impl Default for RefitOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_search: LineSearch::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}
