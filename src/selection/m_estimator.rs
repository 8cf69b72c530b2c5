//! selection::m_estimator — randomized group-lasso M-estimator as a
//! selection procedure.
//!
//! Purpose
//! -------
//! Solve `ℓ(β) + ε/2‖β‖² − ωᵀβ + Σ_g w_g‖β_g‖` for a random draw `ω`,
//! read off the selected groups, and express the KKT conditions as an
//! affine map from `(score state, optimization state)` to `ω`. The result
//! is a [`Query`] ready for conditional sampling.
//!
//! Key behaviors
//! -------------
//! - Stages are distinct types: [`MEstimator`] (configured) →
//!   [`SolvedMEstimator`] (randomized and solved) → [`MEstimatorQuery`]
//!   (sampler-ready). Each stage consumes or borrows the previous one, so
//!   projections cannot be requested before setup.
//! - The optimization state is `[scalings | unpenalized β | inactive
//!   subgradient]`, laid out by [`OptStateLayout`].
//! - [`SolvedMEstimator::setup_sampler`] refits the unpenalized loss on the
//!   active ∪ unpenalized columns, linearizes the gradient around that fit
//!   and rescales both halves of the decomposition by `√scaling`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `scaling ≥ L`, the Lipschitz constant of `∇ℓ`; smaller values are
//!   rejected with [`SelectionError::InvalidScaling`].
//! - Restricted refits need an explicit design. Losses that only expose a
//!   linear transform fail with [`SelectionError::UnsupportedModel`] at
//!   `solve` time.
//! - The observed optimization state is feasible: scalings are group norms
//!   and the subgradient satisfies `‖u_g‖ ≤ w_g` before rescaling.
//!
//! Conventions
//! -----------
//! - Rescaling multiplies scalings and unpenalized coefficients by `√s`
//!   and divides the subgradient by `√s`; the transforms absorb the inverse
//!   factors so `ω = S·s + L·o + o_off` is unchanged.
//! - Inactive groups contribute their dual ball with radius `w_g / √s`.
//!   Only single-coordinate balls become affine constraint rows; larger
//!   balls live in the feasible region alone.
//!
//! Testing notes
//! -------------
//! - Unit tests check feasibility of the observed state, exact
//!   reconstruction of `ω` for a Gaussian loss, SPD conditional covariance,
//!   scaling validation and the unsupported-model path.
use log::debug;
use ndarray::{Array1, Array2, Axis, s};
use rand::Rng;

use crate::{
    constraints::AffineConstraints,
    inference::targets::{Alternative, Target},
    linalg::spd_inverse,
    optimization::{
        proximal::{SolveOptions, solve_penalized},
        refit::RefitOptions,
    },
    randomization::Randomizer,
    selection::{
        decomposition::{
            AffineTransform, ConditionalGaussian, LinearDecomposition, OptStateLayout,
            conditional_gaussian,
        },
        errors::{SelectionError, SelectionResult},
        event::SelectionEvent,
        loss::{LossData, SmoothLoss, restricted_mest},
        penalty::GroupLasso,
        query::{FeasibleRegion, Query},
    },
};

fn indices(mask: &[bool]) -> Vec<usize> {
    (0..mask.len()).filter(|&j| mask[j]).collect()
}

/// Configured, unsolved randomized M-estimator.
#[derive(Debug)]
pub struct MEstimator {
    loss: Box<dyn SmoothLoss>,
    penalty: GroupLasso,
    epsilon: f64,
    randomizer: Randomizer,
    solve_options: SolveOptions,
    refit_options: RefitOptions,
}

impl MEstimator {
    /// Configure a randomized M-estimator with default solver settings.
    ///
    /// # Errors
    /// - [`SelectionError::DimensionMismatch`] if the loss, penalty and
    ///   randomizer disagree on `p`.
    /// - [`SelectionError::InvalidEpsilon`] if `epsilon` is negative or not
    ///   finite.
    pub fn new(
        loss: Box<dyn SmoothLoss>, penalty: GroupLasso, epsilon: f64, randomizer: Randomizer,
    ) -> SelectionResult<Self> {
        let p = loss.dim();
        if penalty.dim() != p {
            return Err(SelectionError::DimensionMismatch {
                context: "penalty dimension",
                expected: p,
                found: penalty.dim(),
            });
        }
        if randomizer.dim() != p {
            return Err(SelectionError::DimensionMismatch {
                context: "randomizer dimension",
                expected: p,
                found: randomizer.dim(),
            });
        }
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(SelectionError::InvalidEpsilon { epsilon });
        }
        Ok(Self {
            loss,
            penalty,
            epsilon,
            randomizer,
            solve_options: SolveOptions::default(),
            refit_options: RefitOptions::default(),
        })
    }

    pub fn with_solve_options(mut self, opts: SolveOptions) -> Self {
        self.solve_options = opts;
        self
    }

    pub fn with_refit_options(mut self, opts: RefitOptions) -> Self {
        self.refit_options = opts;
        self
    }

    pub fn loss(&self) -> &dyn SmoothLoss {
        self.loss.as_ref()
    }

    pub fn penalty(&self) -> &GroupLasso {
        &self.penalty
    }

    pub fn randomizer(&self) -> &Randomizer {
        &self.randomizer
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Draw `ω` from the randomizer and solve the randomized program.
    ///
    /// # Errors
    /// See [`solve_with_perturbation`](Self::solve_with_perturbation).
    pub fn solve<R: Rng + ?Sized>(&self, rng: &mut R) -> SelectionResult<SolvedMEstimator<'_>> {
        let perturbation = self.randomizer.sample(rng);
        self.solve_with_perturbation(perturbation)
    }

    /// solve_with_perturbation — solve for a given perturbation `ω`.
    ///
    /// Returns
    /// -------
    /// A [`SolvedMEstimator`] holding the solution, the selection event
    /// and the unscaled observed optimization state
    /// `[‖β_g‖ (active), β_U, −(∇ℓ(β) + εβ − ω)_I]`.
    ///
    /// Errors
    /// ------
    /// - [`SelectionError::UnsupportedModel`] for a loss without an explicit
    ///   design, since the later restricted refit cannot be formed.
    /// - [`SelectionError::DimensionMismatch`] if `ω` has the wrong length.
    /// - [`SelectionError::Optimization`] if the proximal solver fails.
    pub fn solve_with_perturbation(
        &self, perturbation: Array1<f64>,
    ) -> SelectionResult<SolvedMEstimator<'_>> {
        if let LossData::LinearTransform = self.loss.data() {
            return Err(SelectionError::UnsupportedModel {
                context: "restricted refit requires an explicit design matrix",
            });
        }
        let p = self.loss.dim();
        if perturbation.len() != p {
            return Err(SelectionError::DimensionMismatch {
                context: "perturbation length",
                expected: p,
                found: perturbation.len(),
            });
        }

        let outcome = solve_penalized(
            self.loss(),
            &self.penalty,
            self.epsilon,
            &perturbation.view(),
            &self.solve_options,
        )?;
        let beta = outcome.beta;
        let event = SelectionEvent::from_solution(&beta.view(), &self.penalty);

        let scalings: Vec<f64> = event
            .active_groups()
            .iter()
            .map(|&g| {
                self.penalty.members(g).iter().map(|&j| beta[j] * beta[j]).sum::<f64>().sqrt()
            })
            .collect();
        let unpenalized: Vec<f64> = indices(event.unpenalized()).iter().map(|&j| beta[j]).collect();
        let randomized_grad =
            self.loss.gradient(&beta.view()) + self.epsilon * &beta - &perturbation;
        let subgradient: Vec<f64> =
            indices(&event.inactive()).iter().map(|&j| -randomized_grad[j]).collect();

        let layout = OptStateLayout::new(scalings.len(), unpenalized.len(), subgradient.len());
        let opt_state: Array1<f64> =
            scalings.into_iter().chain(unpenalized).chain(subgradient).collect();

        debug!(
            "M-estimator solved in {} iterations: {} active groups, {} unpenalized, {} inactive",
            outcome.iterations,
            event.active_groups().len(),
            layout.unpenalized.len(),
            layout.subgradient.len()
        );

        Ok(SolvedMEstimator { problem: self, perturbation, beta, event, layout, opt_state })
    }
}

/// Randomized program solved; selection event known.
#[derive(Debug, Clone)]
pub struct SolvedMEstimator<'a> {
    problem: &'a MEstimator,
    perturbation: Array1<f64>,
    beta: Array1<f64>,
    event: SelectionEvent,
    layout: OptStateLayout,
    opt_state: Array1<f64>,
}

impl<'a> SolvedMEstimator<'a> {
    pub fn selection_variable(&self) -> &SelectionEvent {
        &self.event
    }

    /// Solution of the randomized program.
    pub fn solution(&self) -> &Array1<f64> {
        &self.beta
    }

    pub fn perturbation(&self) -> &Array1<f64> {
        &self.perturbation
    }

    pub fn layout(&self) -> &OptStateLayout {
        &self.layout
    }

    /// Optimization state before rescaling.
    pub fn initial_opt_state(&self) -> &Array1<f64> {
        &self.opt_state
    }

    /// setup_sampler — build the affine decomposition and feasible region.
    ///
    /// Parameters
    /// ----------
    /// - `scaling`: rescaling constant `s ≥ L`.
    ///
    /// Returns
    /// -------
    /// An [`MEstimatorQuery`] with the rescaled observed states, the
    /// decomposition `(L, o_off)`, `(S, 0)`, the KKT feasible region and the
    /// conditional Gaussian of the optimization state.
    ///
    /// Notes
    /// -----
    /// - The affine constraints hold `−scaling ≤ 0` rows and `|u_i| ≤ r_i`
    ///   box rows for single-coordinate inactive groups only. The ball
    ///   `‖u_g‖ ≤ w_g / √s` of a multi-coordinate inactive group is not
    ///   affine; the feasible region's projection enforces it during
    ///   sampling, and [`Query::constraints`] does not see it.
    ///
    /// Errors
    /// ------
    /// - [`SelectionError::InvalidScaling`] if `s < L` or `s` is not finite.
    /// - [`SelectionError::UnsupportedModel`] / [`SelectionError::Optimization`]
    ///   from the restricted refit.
    /// - [`SelectionError::Linalg`] if the conditional precision is singular.
    pub fn setup_sampler(self, scaling: f64) -> SelectionResult<MEstimatorQuery<'a>> {
        let problem = self.problem;
        let loss = problem.loss();
        let lipschitz = loss.lipschitz();
        if !scaling.is_finite() || scaling <= 0.0 || scaling < lipschitz {
            return Err(SelectionError::InvalidScaling { scaling, lipschitz });
        }
        let p = loss.dim();
        let sqrt_s = scaling.sqrt();
        let event = &self.event;
        let layout = &self.layout;

        let overall = event.overall();
        let overall_idx = indices(&overall);
        let inactive_idx = indices(&event.inactive());
        let unpenalized_idx = indices(event.unpenalized());
        let k = overall_idx.len();

        let restricted = restricted_mest(loss, &overall, &problem.refit_options)?;
        let mut beta_full = Array1::<f64>::zeros(p);
        for (c, &j) in overall_idx.iter().enumerate() {
            beta_full[j] = restricted[c];
        }
        let hessian = loss.hessian(&beta_full.view());
        let full_grad = loss.gradient(&beta_full.view());

        // Score side.
        let mut score_state = Array1::<f64>::zeros(p);
        let mut score_linear = Array2::<f64>::zeros((p, p));
        for (c, &j) in overall_idx.iter().enumerate() {
            score_state[c] = restricted[c] * sqrt_s;
            score_linear.column_mut(c).assign(&(hessian.column(j).mapv(|h| -h / sqrt_s)));
        }
        for (i, &r) in inactive_idx.iter().enumerate() {
            score_state[k + i] = -full_grad[r] / sqrt_s;
            score_linear[[r, k + i]] = -sqrt_s;
        }

        // Optimization side.
        let mut ridge_hessian = hessian.clone();
        ridge_hessian.diag_mut().mapv_inplace(|h| h + problem.epsilon);
        let d = layout.dim();
        let mut opt_linear = Array2::<f64>::zeros((p, d));
        let mut opt_offset = Array1::<f64>::zeros(p);
        for (c, &group) in event.active_groups().iter().enumerate() {
            let direction = event.directions().column(c);
            let col = ridge_hessian.dot(&direction) / sqrt_s;
            opt_linear.column_mut(layout.scalings.start + c).assign(&col);
            opt_offset.scaled_add(problem.penalty.weights()[group], &direction);
        }
        for (c, &j) in unpenalized_idx.iter().enumerate() {
            let col = ridge_hessian.column(j).mapv(|h| h / sqrt_s);
            opt_linear.column_mut(layout.unpenalized.start + c).assign(&col);
        }
        for (i, &r) in inactive_idx.iter().enumerate() {
            opt_linear[[r, layout.subgradient.start + i]] = sqrt_s;
        }

        let mut opt_state = self.opt_state.clone();
        opt_state.slice_mut(s![layout.scalings.clone()]).mapv_inplace(|v| v * sqrt_s);
        opt_state.slice_mut(s![layout.unpenalized.clone()]).mapv_inplace(|v| v * sqrt_s);
        opt_state.slice_mut(s![layout.subgradient.clone()]).mapv_inplace(|v| v / sqrt_s);

        let decomposition = LinearDecomposition::new(
            AffineTransform::new(opt_linear, opt_offset)?,
            AffineTransform::new(score_linear, Array1::zeros(p))?,
        )?;

        let dual = problem.penalty.dual(&inactive_idx, 1.0 / sqrt_s);
        let (linear_part, offset) = kkt_constraints(layout, &dual.singleton_bounds());
        let region = FeasibleRegion::Kkt {
            scalings: layout.scalings.clone(),
            subgradient: layout.subgradient.clone(),
            dual,
            dim: d,
        };

        let precision = problem.randomizer.precision();
        let conditional = conditional_gaussian(&decomposition, &score_state.view(), &precision)?;
        let constraints = AffineConstraints::new(
            linear_part,
            offset,
            conditional.mean.clone(),
            conditional.covariance.clone(),
        )?;

        debug!(
            "M-estimator sampler ready: scaling {scaling}, opt dim {d}, {} affine rows",
            constraints.num_constraints()
        );

        Ok(MEstimatorQuery {
            problem,
            solution: self.beta,
            perturbation: self.perturbation,
            event: self.event,
            layout: self.layout,
            scaling,
            restricted,
            hessian,
            observed_opt_state: opt_state,
            observed_score_state: score_state,
            decomposition,
            region,
            constraints,
            conditional,
        })
    }
}

// Rows `−o_scaling ≤ 0` and `±u_i ≤ r_i` for singleton inactive groups.
fn kkt_constraints(
    layout: &OptStateLayout, singletons: &[(usize, f64)],
) -> (Array2<f64>, Array1<f64>) {
    let d = layout.dim();
    let rows = layout.scalings.len() + 2 * singletons.len();
    let mut linear = Array2::<f64>::zeros((rows, d));
    let mut offset = Array1::<f64>::zeros(rows);
    for (r, c) in layout.scalings.clone().enumerate() {
        linear[[r, c]] = -1.0;
    }
    let mut r = layout.scalings.len();
    for &(position, radius) in singletons {
        let c = layout.subgradient.start + position;
        linear[[r, c]] = 1.0;
        offset[r] = radius;
        linear[[r + 1, c]] = -1.0;
        offset[r + 1] = radius;
        r += 2;
    }
    (linear, offset)
}

/// Sampler-ready M-estimator.
#[derive(Debug, Clone)]
pub struct MEstimatorQuery<'a> {
    problem: &'a MEstimator,
    solution: Array1<f64>,
    perturbation: Array1<f64>,
    event: SelectionEvent,
    layout: OptStateLayout,
    scaling: f64,
    restricted: Array1<f64>,
    hessian: Array2<f64>,
    observed_opt_state: Array1<f64>,
    observed_score_state: Array1<f64>,
    decomposition: LinearDecomposition,
    region: FeasibleRegion,
    constraints: AffineConstraints,
    conditional: ConditionalGaussian,
}

impl MEstimatorQuery<'_> {
    pub fn solution(&self) -> &Array1<f64> {
        &self.solution
    }

    pub fn perturbation(&self) -> &Array1<f64> {
        &self.perturbation
    }

    pub fn layout(&self) -> &OptStateLayout {
        &self.layout
    }

    pub fn scaling(&self) -> f64 {
        self.scaling
    }

    /// Unpenalized refit on active ∪ unpenalized, in column order.
    pub fn restricted_estimate(&self) -> &Array1<f64> {
        &self.restricted
    }

    /// Hessian of the loss at the embedded restricted refit.
    pub fn hessian(&self) -> &Array2<f64> {
        &self.hessian
    }

    /// parametric_targets — Wald-type target for the selected model.
    ///
    /// Returns
    /// -------
    /// [`Target`] with observed value `β̄_E`, covariance
    /// `dispersion · H_EE⁻¹`, cross-covariance `[√s · cov, 0]` with the
    /// rescaled score state and two-sided alternatives.
    ///
    /// Errors
    /// ------
    /// - [`SelectionError::InvalidDispersion`] unless `dispersion > 0`.
    /// - [`SelectionError::EmptyFeatures`] if nothing was selected.
    /// - [`SelectionError::Linalg`] if `H_EE` is singular.
    pub fn parametric_targets(&self, dispersion: f64) -> SelectionResult<Target> {
        if !dispersion.is_finite() || dispersion <= 0.0 {
            return Err(SelectionError::InvalidDispersion { dispersion });
        }
        let overall_idx = indices(&self.event.overall());
        let k = overall_idx.len();
        if k == 0 {
            return Err(SelectionError::EmptyFeatures);
        }
        let h_ee = self.hessian.select(Axis(0), &overall_idx).select(Axis(1), &overall_idx);
        let covariance = spd_inverse(&h_ee.view(), "restricted Hessian")? * dispersion;
        let p = self.observed_score_state.len();
        let mut crosscov = Array2::<f64>::zeros((k, p));
        crosscov.slice_mut(s![.., 0..k]).assign(&(&covariance * self.scaling.sqrt()));
        Ok(Target {
            observed: self.restricted.clone(),
            covariance,
            crosscov,
            alternatives: vec![Alternative::TwoSided; k],
        })
    }
}

impl Query for MEstimatorQuery<'_> {
    fn selection_variable(&self) -> &SelectionEvent {
        &self.event
    }

    fn observed_opt_state(&self) -> &Array1<f64> {
        &self.observed_opt_state
    }

    fn observed_score_state(&self) -> &Array1<f64> {
        &self.observed_score_state
    }

    fn decomposition(&self) -> &LinearDecomposition {
        &self.decomposition
    }

    fn feasible_region(&self) -> &FeasibleRegion {
        &self.region
    }

    fn constraints(&self) -> &AffineConstraints {
        &self.constraints
    }

    fn conditional(&self) -> &ConditionalGaussian {
        &self.conditional
    }

    fn randomizer(&self) -> &Randomizer {
        &self.problem.randomizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        linalg::{max_asymmetry, min_eigenvalue},
        selection::loss::GaussianLoss,
    };
    use ndarray::ArrayView1;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::StandardNormal;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Gaussian lasso with one unpenalized coordinate, a two-coordinate group
    // and two singleton groups on a seeded random design.
    // -------------------------------------------------------------------------

    fn gaussian_problem(seed: u64) -> MEstimator {
        let mut rng = StdRng::seed_from_u64(seed);
        let (n, p) = (50, 5);
        let x = Array2::from_shape_fn((n, p), |_| rng.sample::<f64, _>(StandardNormal));
        let beta = ndarray::array![1.0, 3.0, 0.0, 0.0, -2.0];
        let noise = Array1::from_shape_fn(n, |_| rng.sample::<f64, _>(StandardNormal));
        let y = x.dot(&beta) + noise;
        let loss = GaussianLoss::new(x, y).unwrap();
        let penalty = GroupLasso::new(vec![0, 1, 1, 2, 3], vec![0.0, 15.0, 15.0, 15.0]).unwrap();
        let randomizer = Randomizer::isotropic_gaussian(p, 7.0).unwrap();
        MEstimator::new(Box::new(loss), penalty, 0.0, randomizer).unwrap()
    }

    #[derive(Debug)]
    struct TransformLoss;

    impl SmoothLoss for TransformLoss {
        fn dim(&self) -> usize {
            2
        }
        fn value(&self, beta: &ArrayView1<f64>) -> f64 {
            0.5 * beta.dot(beta)
        }
        fn gradient(&self, beta: &ArrayView1<f64>) -> Array1<f64> {
            beta.to_owned()
        }
        fn hessian(&self, _beta: &ArrayView1<f64>) -> Array2<f64> {
            Array2::eye(2)
        }
        fn lipschitz(&self) -> f64 {
            1.0
        }
        fn data(&self) -> LossData<'_> {
            LossData::LinearTransform
        }
        fn with_design(&self, _design: Array2<f64>) -> SelectionResult<Box<dyn SmoothLoss>> {
            Err(SelectionError::UnsupportedModel { context: "test transform" })
        }
    }

    #[test]
    // Purpose
    // -------
    // The observed optimization state is feasible and reconstructs the
    // drawn perturbation through the decomposition.
    //
    // Given
    // -----
    // - Seeded Gaussian problem, scaling equal to the Lipschitz constant.
    //
    // Expect
    // ------
    // - Observed state inside the KKT region and the affine constraints.
    // - `S·s + L·o + o_off = ω` to solver accuracy (exact linearization for
    //   a quadratic loss).
    fn observed_state_is_feasible_and_reconstructs_perturbation() {
        // Arrange
        let problem = gaussian_problem(7);
        let mut rng = StdRng::seed_from_u64(11);
        let scaling = problem.loss().lipschitz();

        // Act
        let query = problem.solve(&mut rng).unwrap().setup_sampler(scaling).unwrap();

        // Assert
        let opt = query.observed_opt_state();
        assert!(query.feasible_region().contains(&opt.view(), 1e-8));
        assert!(query.constraints().is_feasible(&opt.view(), 1e-8).unwrap());
        let omega = query
            .decomposition()
            .reconstruct(&opt.view(), &query.observed_score_state().view())
            .unwrap();
        for (a, b) in omega.iter().zip(query.perturbation().iter()) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
        assert!(query.selection_variable().unpenalized()[0]);
    }

    #[test]
    // Purpose
    // -------
    // Conditional covariance is symmetric positive definite and projection
    // is idempotent on arbitrary points.
    fn conditional_covariance_is_spd_and_projection_idempotent() {
        // Arrange
        let problem = gaussian_problem(3);
        let mut rng = StdRng::seed_from_u64(5);
        let query = problem.solve(&mut rng).unwrap().setup_sampler(problem.loss().lipschitz());
        let query = query.unwrap();

        // Act
        let cov = &query.conditional().covariance;
        let d = cov.nrows();
        let x = Array1::from_shape_fn(d, |_| 10.0 * rng.sample::<f64, _>(StandardNormal));
        let once = query.projection(&x.view()).unwrap();
        let twice = query.projection(&once.view()).unwrap();

        // Assert
        assert!(max_asymmetry(&cov.view()) < 1e-10);
        assert!(min_eigenvalue(&cov.view()).unwrap() > 0.0);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Scaling below the Lipschitz constant is rejected; the parametric
    // target has the restricted-fit shape.
    fn setup_validates_scaling_and_targets_have_selected_shape() {
        let problem = gaussian_problem(7);
        let mut rng = StdRng::seed_from_u64(11);
        let lipschitz = problem.loss().lipschitz();

        let err = problem.solve(&mut rng).unwrap().setup_sampler(0.5 * lipschitz);
        assert!(matches!(err, Err(SelectionError::InvalidScaling { .. })));

        let mut rng = StdRng::seed_from_u64(11);
        let query = problem.solve(&mut rng).unwrap().setup_sampler(lipschitz).unwrap();
        let target = query.parametric_targets(1.0).unwrap();
        let k = query.selection_variable().overall().iter().filter(|&&o| o).count();
        assert_eq!(target.observed.len(), k);
        assert_eq!(target.covariance.dim(), (k, k));
        assert_eq!(target.crosscov.dim(), (k, 5));
        assert!(max_asymmetry(&target.covariance.view()) < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // A multi-coordinate inactive group adds no affine rows, yet projection
    // and sampled states stay inside its dual ball.
    //
    // Given
    // -----
    // - Three columns: a singleton group with weight 1 on the signal and a
    //   two-coordinate null group with weight 400; ω = 0.
    //
    // Expect
    // ------
    // - Group 1 inactive; one affine row (the scaling sign) only.
    // - A far-out subgradient projects to norm 400 / √s.
    // - Every sampled state lies in the KKT region.
    fn multi_coordinate_inactive_group_is_enforced_by_projection() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(21);
        let n = 40;
        let x = Array2::from_shape_fn((n, 3), |_| rng.sample::<f64, _>(StandardNormal));
        let noise = Array1::from_shape_fn(n, |_| rng.sample::<f64, _>(StandardNormal));
        let y = x.column(0).mapv(|v| 4.0 * v) + noise;
        let loss = GaussianLoss::new(x, y).unwrap();
        let penalty = GroupLasso::new(vec![0, 1, 1], vec![1.0, 400.0]).unwrap();
        let randomizer = Randomizer::isotropic_gaussian(3, 1.0).unwrap();
        let problem = MEstimator::new(Box::new(loss), penalty, 0.0, randomizer).unwrap();
        let scaling = problem.loss().lipschitz();

        // Act
        let solved = problem.solve_with_perturbation(Array1::zeros(3)).unwrap();
        let query = solved.setup_sampler(scaling).unwrap();
        let layout = query.layout().clone();
        let mut far = query.observed_opt_state().clone();
        far.slice_mut(s![layout.subgradient.clone()]).fill(1e4);
        let projected = query.projection(&far.view()).unwrap();
        let sampler = query.sampler().unwrap();
        let opts = crate::sampling::options::SamplerOptions::new(200, 50, 1, None).unwrap();
        let draws = sampler.sample(&opts, &mut rng).unwrap();

        // Assert
        assert_eq!(query.selection_variable().active_groups(), &[0]);
        assert_eq!(layout.subgradient.len(), 2);
        assert_eq!(query.constraints().num_constraints(), layout.scalings.len());
        let u = projected.slice(s![layout.subgradient.clone()]).to_owned();
        let radius = 400.0 / scaling.sqrt();
        assert!((u.dot(&u).sqrt() - radius).abs() < 1e-8 * radius);
        for draw in draws.rows() {
            assert!(query.feasible_region().contains(&draw, 1e-8));
        }
    }

    #[test]
    // Purpose
    // -------
    // A loss exposing only a linear transform cannot be refit and is
    // refused at solve time.
    fn linear_transform_loss_is_unsupported() {
        let problem = MEstimator::new(
            Box::new(TransformLoss),
            GroupLasso::lasso(vec![1.0, 1.0]).unwrap(),
            0.0,
            Randomizer::isotropic_gaussian(2, 1.0).unwrap(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = problem.solve(&mut rng);
        assert!(matches!(err, Err(SelectionError::UnsupportedModel { .. })));
    }
}
