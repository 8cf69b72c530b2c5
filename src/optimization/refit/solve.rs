//! L-BFGS driver for [`RefitObjective`]s.
use argmin::{
    core::{Executor, IterState, Solver, State, TerminationStatus},
    solver::{
        linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
        quasinewton::LBFGS,
    },
};
use argmin_math::ArgminL2Norm;
use log::{Level, debug, log};
use ndarray::Array1;

use crate::optimization::{
    errors::{OptError, OptResult},
    refit::{
        objective::{NegatedObjective, RefitObjective},
        options::{LineSearch, RefitOptions},
    },
};

type RefitState = IterState<Array1<f64>, Array1<f64>, (), (), (), f64>;
type MtSearch = MoreThuenteLineSearch<Array1<f64>, Array1<f64>, f64>;
type HzSearch = HagerZhangLineSearch<Array1<f64>, Array1<f64>, f64>;

/// Result of a refit, on the scale of the maximized objective.
#[derive(Debug, Clone, PartialEq)]
pub struct RefitOutcome {
    pub theta_hat: Array1<f64>,
    /// `f(θ̂)`.
    pub value: f64,
    /// `false` only if argmin stopped without a termination reason.
    pub converged: bool,
    pub status: String,
    pub iterations: u64,
    /// `‖∇f‖` at the last iterate, when argmin kept it.
    pub grad_norm: Option<f64>,
}

/// maximize — maximize `f` from `theta0` with L-BFGS.
///
/// Parameters
/// ----------
/// - `objective`: smooth concave objective with an analytic gradient.
/// - `theta0`: start, of length `objective.dim()`.
/// - `opts`: line search, memory and stopping rules.
///
/// Errors
/// ------
/// - [`OptError::DimensionMismatch`] if `theta0` has the wrong length.
/// - Errors raised by the objective, unboxed from argmin.
/// - [`OptError::MissingEstimate`] / [`OptError::NonFiniteEstimate`] if
///   the run ends without a usable maximizer.
///
/// # Example
/// ```
/// use ndarray::{Array1, array};
/// use selective_inference::optimization::errors::OptResult;
/// use selective_inference::optimization::refit::{RefitObjective, RefitOptions, maximize};
///
/// struct Bowl;
/// impl RefitObjective for Bowl {
///     fn dim(&self) -> usize {
///         2
///     }
///     fn value(&self, theta: &Array1<f64>) -> OptResult<f64> {
///         Ok(-(theta - 1.0).mapv(|x| x * x).sum())
///     }
///     fn gradient(&self, theta: &Array1<f64>) -> OptResult<Array1<f64>> {
///         Ok(-2.0 * (theta - 1.0))
///     }
/// }
///
/// let out = maximize(&Bowl, array![0.0, 3.0], &RefitOptions::default())?;
/// assert!((out.theta_hat[1] - 1.0).abs() < 1e-6);
/// # Ok::<(), selective_inference::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: RefitObjective + ?Sized>(
    objective: &F, theta0: Array1<f64>, opts: &RefitOptions,
) -> OptResult<RefitOutcome> {
    if theta0.len() != objective.dim() {
        return Err(OptError::DimensionMismatch {
            context: "refit start",
            expected: objective.dim(),
            found: theta0.len(),
        });
    }
    let problem = NegatedObjective::new(objective);
    let mem = opts.memory();
    match opts.line_search {
        LineSearch::MoreThuente => {
            let solver = with_tolerances(LBFGS::new(MtSearch::new(), mem), opts)?;
            run(problem, solver, theta0, opts)
        }
        LineSearch::HagerZhang => {
            let solver = with_tolerances(LBFGS::new(HzSearch::new(), mem), opts)?;
            run(problem, solver, theta0, opts)
        }
    }
}

fn with_tolerances<L>(
    mut solver: LBFGS<L, Array1<f64>, Array1<f64>, f64>, opts: &RefitOptions,
) -> OptResult<LBFGS<L, Array1<f64>, Array1<f64>, f64>> {
    if let Some(tol) = opts.tols.grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}

fn run<'a, F, S>(
    problem: NegatedObjective<'a, F>, solver: S, theta0: Array1<f64>, opts: &RefitOptions,
) -> OptResult<RefitOutcome>
where
    F: RefitObjective + ?Sized,
    S: Solver<NegatedObjective<'a, F>, RefitState> + Send + 'static,
{
    debug!("Refit start: dim = {}", theta0.len());
    let max_iter = opts.tols.max_iter;
    let result = Executor::new(problem, solver)
        .configure(|state| match max_iter {
            Some(n) => state.param(theta0).max_iters(n as u64),
            None => state.param(theta0),
        })
        .run()?;
    let state = result.state();

    let theta_hat = state.get_best_param().cloned().ok_or(OptError::MissingEstimate)?;
    if let Some((index, &value)) = theta_hat.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::NonFiniteEstimate { index, value });
    }
    let value = -state.get_best_cost();
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    let (converged, status) = match state.get_termination_status() {
        TerminationStatus::NotTerminated => (false, "not terminated".to_string()),
        status => (true, format!("{status:?}")),
    };
    let outcome = RefitOutcome {
        theta_hat,
        value,
        converged,
        status,
        iterations: state.get_iter(),
        grad_norm: state.get_gradient().map(|g| g.l2_norm()),
    };

    let level = if opts.verbose { Level::Info } else { Level::Debug };
    log!(
        level,
        "Refit finished: {} after {} iterations, f = {:.6e}",
        outcome.status,
        outcome.iterations,
        outcome.value
    );
    Ok(outcome)
}
