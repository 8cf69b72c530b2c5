//! Integration tests for the selective-inference pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path from a randomized selection, through the
//!   conditional sampler, to selective p-values and intervals.
//! - Validate the selective MLE surface: the one-dimensional thresholded
//!   problem, its reusable map and the bootstrap built on it.
//!
//! Coverage
//! --------
//! - `selection::screening`: closed-form selection rule, sampling and
//!   intervals for a single screened coordinate.
//! - `selection::m_estimator`: feasibility of observed and sampled states,
//!   projection idempotence, SPD conditional covariance, parametric
//!   targets, p-values and their uniformity under the global null.
//! - `adjusted_mle`: `solve_umvu`, `MleMap::apply` round trip,
//!   monotonicity and `bootstrap_mle`.
//!
//! Exclusions
//! ----------
//! - Option validation and low-level linear algebra, which are covered by
//!   unit tests next to the code.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, array};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, StandardNormal};
use selective_inference::{
    linalg::{max_asymmetry, min_eigenvalue},
    prelude::*,
    selection::LossData,
};

/// Gaussian lasso on a seeded `50 × 5` design with one unpenalized
/// coordinate, one two-coordinate group and two singleton groups.
fn group_lasso_problem(seed: u64) -> MEstimator {
    let mut rng = StdRng::seed_from_u64(seed);
    let (n, p) = (50, 5);
    let x = Array2::from_shape_fn((n, p), |_| rng.sample::<f64, _>(StandardNormal));
    let beta = array![1.0, 3.0, 0.0, 0.0, -2.0];
    let noise = Array1::from_shape_fn(n, |_| rng.sample::<f64, _>(StandardNormal));
    let y = x.dot(&beta) + noise;
    let loss = GaussianLoss::new(x, y).unwrap();
    let penalty = GroupLasso::new(vec![0, 1, 1, 2, 3], vec![0.0, 15.0, 15.0, 15.0]).unwrap();
    let randomizer = Randomizer::isotropic_gaussian(p, 7.0).unwrap();
    MEstimator::new(Box::new(loss), penalty, 0.0, randomizer).unwrap()
}

/// Lasso under the global null: seeded `100 × 5` Gaussian design,
/// `y ~ N(0, I)` and a common weight on five singleton groups.
fn null_lasso_problem(seed: u64) -> MEstimator {
    let mut rng = StdRng::seed_from_u64(seed);
    let (n, p) = (100, 5);
    let x = Array2::from_shape_fn((n, p), |_| rng.sample::<f64, _>(StandardNormal));
    let y = Array1::from_shape_fn(n, |_| rng.sample::<f64, _>(StandardNormal));
    let loss = GaussianLoss::new(x, y).unwrap();
    let penalty = GroupLasso::lasso(vec![12.0; p]).unwrap();
    let randomizer = Randomizer::isotropic_gaussian(p, 7.0).unwrap();
    MEstimator::new(Box::new(loss), penalty, 0.0, randomizer).unwrap()
}

/// The thresholded problem `ω = −T + o + threshold` with unit variances.
fn thresholded_mle(target_observed: f64, threshold: f64) -> SelectiveMle {
    solve_umvu(
        &AffineTransform::new(array![[-1.0]], array![0.0]).unwrap(),
        &AffineTransform::new(array![[1.0]], array![threshold]).unwrap(),
        &array![target_observed].view(),
        &array![1.0].view(),
        &array![[1.0]].view(),
        &RandomizerPrecision::Isotropic(1.0),
    )
    .unwrap()
}

fn scaled_sum(x: &ArrayView2<f64>) -> Array1<f64> {
    array![x.column(0).sum() / (x.nrows() as f64).sqrt()]
}

#[test]
// Purpose
// -------
// Screening with seeded perturbations selects exactly when |2 − ω| ≥ 2.
//
// Given
// -----
// - Score 2, threshold 2, unit isotropic randomizer, 200 seeded draws.
//
// Expect
// ------
// - The selection indicator matches the closed form for every draw.
fn screening_selection_follows_closed_form_rule() {
    // Arrange
    let problem = ScreeningProblem::from_score(
        array![2.0],
        array![[1.0]],
        Randomizer::isotropic_gaussian(1, 1.0).unwrap(),
        array![2.0],
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..200 {
        // Act
        let query = problem.fit(&mut rng).unwrap();

        // Assert
        let omega = query.perturbation()[0];
        let expected = (2.0_f64 - omega).abs() >= 2.0;
        assert_eq!(query.selection_variable().selected()[0], expected, "omega = {omega}");
    }
}

#[test]
// Purpose
// -------
// Sample, p-value and interval for a screened coordinate far from its
// threshold behave like unselected inference.
//
// Given
// -----
// - Z = 8, threshold 1, unit variances, ω = 0, 3000 Langevin draws.
//
// Expect
// ------
// - All draws feasible.
// - 90% interval within 0.6 of 8 ± 1.645.
// - Two-sided p-value for H0: μ = 0 essentially zero.
fn screening_interval_far_from_threshold() {
    // Arrange
    let problem = ScreeningProblem::new(
        array![8.0],
        array![[1.0]],
        Randomizer::isotropic_gaussian(1, 1.0).unwrap(),
        array![1.0],
    )
    .unwrap();
    let query = problem.fit_with_perturbation(array![0.0]).unwrap();
    let sampler = query.sampler().unwrap();
    let target = query.marginal_targets(&[true]).unwrap();
    let opts = SamplerOptions::new(3000, 300, 1, None).unwrap();
    let mut rng = StdRng::seed_from_u64(12);

    // Act
    let draws = sampler.sample(&opts, &mut rng).unwrap();
    let intervals = sampler.confidence_intervals(&draws.view(), &target, 0.9, &mut rng).unwrap();
    let pvalues = sampler.coefficient_pvalues(&draws.view(), &target, None, &mut rng).unwrap();

    // Assert
    assert!(draws.iter().all(|&v| v >= 0.0));
    let (lo, hi) = intervals[0];
    assert!((lo - 6.355).abs() < 0.6, "lo = {lo}");
    assert!((hi - 9.645).abs() < 0.6, "hi = {hi}");
    assert!(pvalues[0] < 1e-3, "p = {}", pvalues[0]);
}

#[test]
// Purpose
// -------
// The M-estimator path produces a feasible observed state, a valid
// conditional law and a chain that never leaves the KKT region.
//
// Given
// -----
// - Seeded group-lasso problem, scaling equal to the Lipschitz constant.
//
// Expect
// ------
// - Observed state feasible; decomposition reconstructs ω.
// - Conditional covariance symmetric positive definite.
// - Projection idempotent; every sampled state in the region.
fn m_estimator_pipeline_is_feasible_end_to_end() {
    // Arrange
    let problem = group_lasso_problem(7);
    let mut rng = StdRng::seed_from_u64(11);
    let scaling = problem.loss().lipschitz();
    let query = problem.solve(&mut rng).unwrap().setup_sampler(scaling).unwrap();

    // Act
    let opt = query.observed_opt_state().clone();
    let omega = query
        .decomposition()
        .reconstruct(&opt.view(), &query.observed_score_state().view())
        .unwrap();
    let sampler = query.sampler().unwrap();
    let opts = SamplerOptions::new(300, 100, 2, None).unwrap();
    let draws = sampler.sample(&opts, &mut rng).unwrap();

    // Assert
    assert!(query.feasible_region().contains(&opt.view(), 1e-8));
    for (a, b) in omega.iter().zip(query.perturbation().iter()) {
        assert!((a - b).abs() < 1e-4, "{a} vs {b}");
    }
    let cov = &query.conditional().covariance;
    assert!(max_asymmetry(&cov.view()) < 1e-10);
    assert!(min_eigenvalue(&cov.view()).unwrap() > 0.0);
    for draw in draws.rows() {
        assert!(query.feasible_region().contains(&draw, 1e-8));
        let again = query.projection(&draw).unwrap();
        assert!((&again - &draw).iter().all(|v| v.abs() < 1e-12));
    }
}

#[test]
// Purpose
// -------
// Parametric targets of a fitted M-estimator feed selective p-values.
//
// Expect
// ------
// - One p-value per selected coordinate, each in [0, 1].
fn m_estimator_pvalues_are_probabilities() {
    // Arrange
    let problem = group_lasso_problem(3);
    let mut rng = StdRng::seed_from_u64(5);
    let scaling = problem.loss().lipschitz();
    let query = problem.solve(&mut rng).unwrap().setup_sampler(scaling).unwrap();
    let target = query.parametric_targets(1.0).unwrap();
    let sampler = query.sampler().unwrap();
    let opts = SamplerOptions::new(500, 200, 1, None).unwrap();

    // Act
    let draws = sampler.sample(&opts, &mut rng).unwrap();
    let pvalues = sampler.coefficient_pvalues(&draws.view(), &target, None, &mut rng).unwrap();

    // Assert
    assert_eq!(pvalues.len(), target.dim());
    assert!(pvalues.iter().all(|p| (0.0..=1.0).contains(p)), "{pvalues}");
}

#[test]
// Purpose
// -------
// Selective p-values of the M-estimator are uniform under the global
// null, so the score transform and `opt_linear` carry the right law.
//
// Given
// -----
// - 150 seeded null lasso problems (n = 100, p = 5, β = 0), scaling equal
//   to the Lipschitz constant, 500 Langevin draws each.
// - p-values of every selected coordinate pooled across seeds; seeds that
//   select nothing are skipped.
//
// Expect
// ------
// - At least 100 pooled p-values.
// - P(p < 0.1) within [0.02, 0.2] and P(p < 0.5) within [0.34, 0.66].
fn m_estimator_null_pvalues_are_uniform() {
    // Arrange
    let opts = SamplerOptions::new(500, 100, 1, None).unwrap();
    let mut pooled: Vec<f64> = Vec::new();

    for seed in 0..150_u64 {
        let problem = null_lasso_problem(seed);
        let mut rng = StdRng::seed_from_u64(10_000 + seed);
        let scaling = problem.loss().lipschitz();
        let query = problem.solve(&mut rng).unwrap().setup_sampler(scaling).unwrap();
        let target = match query.parametric_targets(1.0) {
            Ok(target) => target,
            Err(SelectionError::EmptyFeatures) => continue,
            Err(err) => panic!("seed {seed}: {err}"),
        };

        // Act
        let sampler = query.sampler().unwrap();
        let draws = sampler.sample(&opts, &mut rng).unwrap();
        let pvalues = sampler.coefficient_pvalues(&draws.view(), &target, None, &mut rng).unwrap();
        pooled.extend(pvalues.iter().copied());
    }

    // Assert
    let n = pooled.len() as f64;
    let below = |level: f64| pooled.iter().filter(|&&p| p < level).count() as f64 / n;
    assert!(pooled.len() >= 100, "only {} p-values", pooled.len());
    let (tenth, half) = (below(0.1), below(0.5));
    assert!((0.02..=0.2).contains(&tenth), "P(p < 0.1) = {tenth}");
    assert!((0.34..=0.66).contains(&half), "P(p < 0.5) = {half}");
}

#[test]
// Purpose
// -------
// A loss that exposes only a linear transform cannot be refit.
//
// Expect
// ------
// - `SelectionError::UnsupportedModel` from `solve`.
fn linear_transform_loss_is_rejected() {
    #[derive(Debug)]
    struct Implicit;

    impl SmoothLoss for Implicit {
        fn dim(&self) -> usize {
            1
        }
        fn value(&self, beta: &ArrayView1<f64>) -> f64 {
            0.5 * beta.dot(beta)
        }
        fn gradient(&self, beta: &ArrayView1<f64>) -> Array1<f64> {
            beta.to_owned()
        }
        fn hessian(&self, _beta: &ArrayView1<f64>) -> Array2<f64> {
            Array2::eye(1)
        }
        fn lipschitz(&self) -> f64 {
            1.0
        }
        fn data(&self) -> LossData<'_> {
            LossData::LinearTransform
        }
        fn with_design(&self, _design: Array2<f64>) -> SelectionResult<Box<dyn SmoothLoss>> {
            Err(SelectionError::UnsupportedModel { context: "implicit loss" })
        }
    }

    let problem = MEstimator::new(
        Box::new(Implicit),
        GroupLasso::lasso(vec![1.0]).unwrap(),
        0.0,
        Randomizer::isotropic_gaussian(1, 1.0).unwrap(),
    )
    .unwrap();
    let res = problem.solve(&mut StdRng::seed_from_u64(0));
    assert!(matches!(res, Err(SelectionError::UnsupportedModel { .. })));
}

#[test]
// Purpose
// -------
// The thresholded MLE problem returns finite outputs and a map that
// reproduces them.
//
// Given
// -----
// - n = 1, threshold 2, randomization scale 1, observed target 2.
//
// Expect
// ------
// - Finite estimate ≈ 1.2451 and value ≈ 1.1285.
// - `map.apply(2)` returns the same pair.
fn selective_mle_round_trip() {
    // Arrange / Act
    let mle = thresholded_mle(2.0, 2.0);
    let (estimate, value) = mle.map.apply(&array![2.0].view()).unwrap();

    // Assert
    assert!(mle.estimate[0].is_finite() && mle.value.is_finite());
    assert!((mle.estimate[0] - 1.2451).abs() < 1e-3);
    assert!((mle.value - 1.1285).abs() < 1e-3);
    assert!((estimate[0] - mle.estimate[0]).abs() < 1e-10);
    assert!((value - mle.value).abs() < 1e-10);
}

#[test]
// Purpose
// -------
// The selective MLE is non-decreasing in the observed target and shrinks
// toward the selection boundary.
//
// Expect
// ------
// - Monotone over t ∈ [−3, 7]; estimate below t for every t.
fn selective_mle_is_monotone() {
    let mle = thresholded_mle(2.0, 2.0);
    let mut previous = f64::NEG_INFINITY;
    for i in 0..=50 {
        let t = -3.0 + 0.2 * i as f64;
        let (estimate, _) = mle.map.apply(&array![t].view()).unwrap();
        assert!(estimate[0] >= previous - 1e-9, "non-monotone at t = {t}");
        assert!(estimate[0] < t, "no shrinkage at t = {t}");
        previous = estimate[0];
    }
}

#[test]
// Purpose
// -------
// Bootstrap replicates through the fixed map centre on the plug-in MLE.
//
// Given
// -----
// - 100 draws from N(0.45, 1), target Z = Σ xᵢ / √n, B = 1000.
//
// Expect
// ------
// - Bootstrap mean within 0.25 of the plug-in estimate.
fn bootstrap_calibration_centres_on_plug_in() {
    // Arrange
    let mut rng = StdRng::seed_from_u64(77);
    let normal = Normal::new(0.45, 1.0).unwrap();
    let data = Array2::from_shape_fn((100, 1), |_| normal.sample(&mut rng));
    let observed = scaled_sum(&data.view());
    let mle = thresholded_mle(observed[0], 2.0);

    // Act
    let boot = bootstrap_mle(&mle.map, &data.view(), scaled_sum, 1000, &mut rng).unwrap();

    // Assert
    let mean = boot.column(0).mean().unwrap();
    assert!((mean - mle.estimate[0]).abs() < 0.25, "mean {mean} vs {}", mle.estimate[0]);
}
