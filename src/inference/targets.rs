//! inference::targets — linear targets of a selected model.
//!
//! A [`Target`] describes a `k`-dimensional statistic `T̂`: its observed
//! value, its covariance, and its cross-covariance with the score state.
//! The cross-covariance is what lets inference move the score along with a
//! hypothesized target value while holding the nuisance part fixed.
use std::str::FromStr;

use ndarray::{Array1, Array2};

use crate::inference::errors::{InferenceError, InferenceResult};

/// Direction of the alternative hypothesis for one target coordinate.
///
/// Parses case-insensitively from `"twosided"`, `"less"` or `"greater"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    Less,
    Greater,
}

impl FromStr for Alternative {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twosided" | "two-sided" => Ok(Alternative::TwoSided),
            "less" => Ok(Alternative::Less),
            "greater" => Ok(Alternative::Greater),
            _ => Err(format!(
                "Invalid alternative '{s}': valid options are 'twosided', 'less' or 'greater'."
            )),
        }
    }
}

/// Observed statistic with its covariance and score cross-covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Observed value, length `k`.
    pub observed: Array1<f64>,
    /// `k × k` covariance.
    pub covariance: Array2<f64>,
    /// `k × p` covariance with the score state.
    pub crosscov: Array2<f64>,
    /// One alternative per coordinate.
    pub alternatives: Vec<Alternative>,
}

impl Target {
    /// # Errors
    /// [`InferenceError::DimensionMismatch`] if the pieces disagree on `k`.
    pub fn new(
        observed: Array1<f64>, covariance: Array2<f64>, crosscov: Array2<f64>,
        alternatives: Vec<Alternative>,
    ) -> InferenceResult<Self> {
        let k = observed.len();
        for (context, found) in [
            ("target covariance rows", covariance.nrows()),
            ("target covariance cols", covariance.ncols()),
            ("target cross-covariance rows", crosscov.nrows()),
            ("target alternatives", alternatives.len()),
        ] {
            if found != k {
                return Err(InferenceError::DimensionMismatch { context, expected: k, found });
            }
        }
        Ok(Self { observed, covariance, crosscov, alternatives })
    }

    pub fn dim(&self) -> usize {
        self.observed.len()
    }
}
