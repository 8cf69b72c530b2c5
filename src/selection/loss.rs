//! selection::loss — smooth losses consumed by the M-estimator builder.
//!
//! Purpose
//! -------
//! Provide the smooth part `ℓ(β)` of a randomized convex program together
//! with its derivatives and a Lipschitz bound on its gradient, plus the
//! restricted refit used to form the score of a selected model.
//!
//! Key behaviors
//! -------------
//! - [`SmoothLoss`] is the collaborator contract: value, gradient, Hessian,
//!   Lipschitz constant, access to the underlying data, and re-targeting to
//!   a new design via [`SmoothLoss::with_design`].
//! - [`GaussianLoss`] is `½‖y − Xβ‖²`; [`LogisticLoss`] is the binomial
//!   deviance `Σ log(1 + e^{xᵢβ}) − yᵢ xᵢβ`.
//! - [`restricted_mest`] fits the unpenalized loss on a column subset with
//!   the argmin L-BFGS maximizer.
//!
//! Invariants & assumptions
//! ------------------------
//! - Coefficient vectors passed to a loss have length [`SmoothLoss::dim`];
//!   builders check this at their boundary.
//! - A loss whose data is [`LossData::LinearTransform`] has no explicit
//!   design; restricted refits on it are refused with
//!   [`SelectionError::UnsupportedModel`].
use std::fmt::Debug;

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::{
    linalg::max_eigenvalue,
    optimization::{
        errors::OptResult,
        refit::{RefitObjective, RefitOptions, maximize},
    },
    selection::errors::{SelectionError, SelectionResult},
};

/// Data behind a loss.
#[derive(Debug, Clone, Copy)]
pub enum LossData<'a> {
    /// Design matrix `X` (`n × p`) and response `y` (`n`).
    Explicit { design: &'a Array2<f64>, response: &'a Array1<f64> },
    /// The loss acts through an abstract linear map with no explicit matrix.
    LinearTransform,
}

/// Smooth loss collaborator.
pub trait SmoothLoss: Debug {
    /// Number of coefficients.
    fn dim(&self) -> usize;

    fn value(&self, beta: &ArrayView1<f64>) -> f64;

    fn gradient(&self, beta: &ArrayView1<f64>) -> Array1<f64>;

    fn hessian(&self, beta: &ArrayView1<f64>) -> Array2<f64>;

    /// Upper bound on the Lipschitz constant of the gradient.
    fn lipschitz(&self) -> f64;

    fn data(&self) -> LossData<'_>;

    /// Same loss family and response on a different design.
    fn with_design(&self, design: Array2<f64>) -> SelectionResult<Box<dyn SmoothLoss>>;
}

fn check_data(design: &Array2<f64>, response: &Array1<f64>) -> SelectionResult<()> {
    if design.nrows() != response.len() {
        return Err(SelectionError::DimensionMismatch {
            context: "loss response",
            expected: design.nrows(),
            found: response.len(),
        });
    }
    Ok(())
}

fn gram_bound(design: &Array2<f64>) -> SelectionResult<f64> {
    let gram = design.t().dot(design);
    Ok(max_eigenvalue(&gram.view())?)
}

/// Squared-error loss `½‖y − Xβ‖²`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianLoss {
    design: Array2<f64>,
    response: Array1<f64>,
    lipschitz: f64,
}

impl GaussianLoss {
    /// # Errors
    /// - [`SelectionError::DimensionMismatch`] if `X` and `y` disagree on `n`.
    /// - [`SelectionError::Linalg`] if `XᵀX` contains non-finite entries.
    pub fn new(design: Array2<f64>, response: Array1<f64>) -> SelectionResult<Self> {
        check_data(&design, &response)?;
        let lipschitz = gram_bound(&design)?;
        Ok(Self { design, response, lipschitz })
    }
}

impl SmoothLoss for GaussianLoss {
    fn dim(&self) -> usize {
        self.design.ncols()
    }

    fn value(&self, beta: &ArrayView1<f64>) -> f64 {
        let resid = &self.response - &self.design.dot(beta);
        0.5 * resid.dot(&resid)
    }

    fn gradient(&self, beta: &ArrayView1<f64>) -> Array1<f64> {
        let resid = &self.response - &self.design.dot(beta);
        -self.design.t().dot(&resid)
    }

    fn hessian(&self, _beta: &ArrayView1<f64>) -> Array2<f64> {
        self.design.t().dot(&self.design)
    }

    fn lipschitz(&self) -> f64 {
        self.lipschitz
    }

    fn data(&self) -> LossData<'_> {
        LossData::Explicit { design: &self.design, response: &self.response }
    }

    fn with_design(&self, design: Array2<f64>) -> SelectionResult<Box<dyn SmoothLoss>> {
        Ok(Box::new(GaussianLoss::new(design, self.response.clone())?))
    }
}

/// Binomial deviance with canonical logit link; `y ∈ [0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticLoss {
    design: Array2<f64>,
    response: Array1<f64>,
    lipschitz: f64,
}

impl LogisticLoss {
    /// # Errors
    /// - [`SelectionError::DimensionMismatch`] if `X` and `y` disagree on `n`.
    /// - [`SelectionError::Linalg`] if `XᵀX` contains non-finite entries.
    pub fn new(design: Array2<f64>, response: Array1<f64>) -> SelectionResult<Self> {
        check_data(&design, &response)?;
        let lipschitz = 0.25 * gram_bound(&design)?;
        Ok(Self { design, response, lipschitz })
    }

    fn mean(&self, beta: &ArrayView1<f64>) -> Array1<f64> {
        self.design.dot(beta).mapv(|eta| 1.0 / (1.0 + (-eta).exp()))
    }
}

fn softplus(eta: f64) -> f64 {
    eta.max(0.0) + (-eta.abs()).exp().ln_1p()
}

impl SmoothLoss for LogisticLoss {
    fn dim(&self) -> usize {
        self.design.ncols()
    }

    fn value(&self, beta: &ArrayView1<f64>) -> f64 {
        let eta = self.design.dot(beta);
        eta.iter().zip(self.response.iter()).map(|(&e, &y)| softplus(e) - y * e).sum()
    }

    fn gradient(&self, beta: &ArrayView1<f64>) -> Array1<f64> {
        let resid = self.mean(beta) - &self.response;
        self.design.t().dot(&resid)
    }

    fn hessian(&self, beta: &ArrayView1<f64>) -> Array2<f64> {
        let w = self.mean(beta).mapv(|pi| pi * (1.0 - pi));
        let weighted = &self.design * &w.insert_axis(Axis(1));
        self.design.t().dot(&weighted)
    }

    fn lipschitz(&self) -> f64 {
        self.lipschitz
    }

    fn data(&self) -> LossData<'_> {
        LossData::Explicit { design: &self.design, response: &self.response }
    }

    fn with_design(&self, design: Array2<f64>) -> SelectionResult<Box<dyn SmoothLoss>> {
        Ok(Box::new(LogisticLoss::new(design, self.response.clone())?))
    }
}

/// `f(θ) = −loss(θ)`, so a loss can be refit by the maximizer.
#[derive(Debug)]
pub struct NegatedLoss<'a> {
    loss: &'a dyn SmoothLoss,
}

impl<'a> NegatedLoss<'a> {
    pub fn new(loss: &'a dyn SmoothLoss) -> Self {
        Self { loss }
    }
}

impl RefitObjective for NegatedLoss<'_> {
    fn dim(&self) -> usize {
        self.loss.dim()
    }

    fn value(&self, theta: &Array1<f64>) -> OptResult<f64> {
        Ok(-self.loss.value(&theta.view()))
    }

    fn gradient(&self, theta: &Array1<f64>) -> OptResult<Array1<f64>> {
        Ok(-self.loss.gradient(&theta.view()))
    }
}

/// restricted_mest — unpenalized fit of `loss` on the columns in `support`.
///
/// Parameters
/// ----------
/// - `loss`: loss with an explicit design `X` (`n × p`).
/// - `support`: mask of length `p`; `true` columns enter the refit.
/// - `opts`: L-BFGS configuration.
///
/// Returns
/// -------
/// Coefficients on the support, in increasing column order. Empty when the
/// support is empty.
///
/// Errors
/// ------
/// - [`SelectionError::UnsupportedModel`] for [`LossData::LinearTransform`].
/// - [`SelectionError::DimensionMismatch`] if `support.len() != p`.
/// - [`SelectionError::Optimization`] if L-BFGS fails.
pub fn restricted_mest(
    loss: &dyn SmoothLoss, support: &[bool], opts: &RefitOptions,
) -> SelectionResult<Array1<f64>> {
    let design = match loss.data() {
        LossData::Explicit { design, .. } => design,
        LossData::LinearTransform => {
            return Err(SelectionError::UnsupportedModel {
                context: "restricted refit requires an explicit design matrix",
            });
        }
    };
    if support.len() != loss.dim() {
        return Err(SelectionError::DimensionMismatch {
            context: "restricted support",
            expected: loss.dim(),
            found: support.len(),
        });
    }
    let columns: Vec<usize> = (0..support.len()).filter(|&j| support[j]).collect();
    if columns.is_empty() {
        return Ok(Array1::zeros(0));
    }
    let restricted = loss.with_design(design.select(Axis(1), &columns))?;
    let objective = NegatedLoss::new(restricted.as_ref());
    let outcome = maximize(&objective, Array1::zeros(columns.len()), opts)?;
    Ok(outcome.theta_hat)
}
