//! selection::screening — randomized marginal screening.
//!
//! Purpose
//! -------
//! Select coordinates of a score vector whose randomized magnitude clears
//! a threshold, and express that event in the same affine form as the
//! M-estimator so the same sampler and inference code apply.
//!
//! Key behaviors
//! -------------
//! - With randomized residual `r = s − ω`, coordinate `j` is selected iff
//!   `|r_j| ≥ t_j`. Its sign is `sign(−r_j)` and its optimization variable
//!   is the excess `|r_j| − t_j ≥ 0`.
//! - The decomposition is `ω = s + L·o + o_off` with `L` embedding the
//!   signs into the selected rows, `o_off = sign·t` on selected rows and
//!   `o_off = −r` elsewhere, so the observed perturbation is reconstructed
//!   exactly.
//! - [`ScreeningProblem::type1`] derives per-coordinate thresholds from a
//!   marginal false-selection level via the normal quantile of the
//!   randomized standard deviation.
//! - [`ScreeningQuery::multivariate_targets`] and
//!   [`ScreeningQuery::marginal_targets`] are read-only target accessors.
//!
//! Conventions
//! -----------
//! - [`ScreeningProblem::new`] takes observed data `Z ~ N(μ, Σ)` and uses
//!   the score `s = −Z`; [`ScreeningProblem::from_score`] takes `s` as is.
use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{
    constraints::AffineConstraints,
    inference::targets::{Alternative, Target},
    linalg::{LinalgError, spd_inverse},
    randomization::Randomizer,
    selection::{
        decomposition::{
            AffineTransform, ConditionalGaussian, LinearDecomposition, conditional_gaussian,
        },
        errors::{SelectionError, SelectionResult},
        event::{SelectionEvent, sign},
        query::{FeasibleRegion, Query},
    },
};

/// Randomized thresholding of a score vector.
#[derive(Debug, Clone)]
pub struct ScreeningProblem {
    score: Array1<f64>,
    covariance: Array2<f64>,
    randomizer: Randomizer,
    thresholds: Array1<f64>,
}

impl ScreeningProblem {
    /// Screening of observed data `Z` with covariance `Σ`; the score is `−Z`.
    ///
    /// # Errors
    /// See [`from_score`](Self::from_score).
    pub fn new(
        observed_data: Array1<f64>, covariance: Array2<f64>, randomizer: Randomizer,
        thresholds: Array1<f64>,
    ) -> SelectionResult<Self> {
        Self::from_score(-observed_data, covariance, randomizer, thresholds)
    }

    /// Screening of a score vector `s` directly.
    ///
    /// # Errors
    /// - [`SelectionError::DimensionMismatch`] if score, covariance,
    ///   randomizer and thresholds disagree on `p`.
    /// - [`SelectionError::InvalidThreshold`] for a non-positive or
    ///   non-finite threshold.
    pub fn from_score(
        score: Array1<f64>, covariance: Array2<f64>, randomizer: Randomizer,
        thresholds: Array1<f64>,
    ) -> SelectionResult<Self> {
        let p = score.len();
        let (rows, cols) = covariance.dim();
        if rows != cols {
            return Err(LinalgError::NotSquare { rows, cols }.into());
        }
        for (context, found) in [
            ("screening covariance", rows),
            ("screening randomizer", randomizer.dim()),
            ("screening thresholds", thresholds.len()),
        ] {
            if found != p {
                return Err(SelectionError::DimensionMismatch { context, expected: p, found });
            }
        }
        for (index, &value) in thresholds.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(SelectionError::InvalidThreshold { index, value });
            }
        }
        Ok(Self { score, covariance, randomizer, thresholds })
    }

    /// type1 — marginal screening at a false-selection level.
    ///
    /// Thresholds are `t_j = √(Σ_jj + σ²) · Φ⁻¹(1 − level/2)` with an
    /// isotropic Gaussian randomizer of scale `σ`, so a null coordinate is
    /// selected with probability `level`.
    ///
    /// # Errors
    /// - [`SelectionError::InvalidLevel`] unless `0 < level < 1`.
    /// - [`SelectionError::Randomizer`] for an invalid `randomizer_scale`.
    /// - As in [`new`](Self::new).
    pub fn type1(
        observed_data: Array1<f64>, covariance: Array2<f64>, randomizer_scale: f64, level: f64,
    ) -> SelectionResult<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(SelectionError::InvalidLevel { level });
        }
        let p = observed_data.len();
        let randomizer = Randomizer::isotropic_gaussian(p, randomizer_scale)?;
        if covariance.nrows() != p || covariance.ncols() != p {
            return Err(SelectionError::DimensionMismatch {
                context: "screening covariance",
                expected: p,
                found: covariance.nrows(),
            });
        }
        let quantile = Normal::standard().inverse_cdf(1.0 - 0.5 * level);
        let scale2 = randomizer_scale * randomizer_scale;
        let thresholds = covariance.diag().mapv(|v| (v + scale2).sqrt() * quantile);
        Self::new(observed_data, covariance, randomizer, thresholds)
    }

    pub fn score(&self) -> &Array1<f64> {
        &self.score
    }

    pub fn thresholds(&self) -> &Array1<f64> {
        &self.thresholds
    }

    pub fn randomizer(&self) -> &Randomizer {
        &self.randomizer
    }

    /// Draw `ω` and fit.
    pub fn fit<R: Rng + ?Sized>(&self, rng: &mut R) -> SelectionResult<ScreeningQuery<'_>> {
        let perturbation = self.randomizer.sample(rng);
        self.fit_with_perturbation(perturbation)
    }

    /// fit_with_perturbation — apply the screening rule for a given `ω`.
    ///
    /// Returns
    /// -------
    /// A sampler-ready [`ScreeningQuery`]. An empty selection is a valid
    /// outcome with a zero-dimensional optimization state.
    ///
    /// Errors
    /// ------
    /// - [`SelectionError::DimensionMismatch`] if `ω` has the wrong length.
    /// - [`SelectionError::Linalg`] if the conditional precision is singular.
    pub fn fit_with_perturbation(
        &self, perturbation: Array1<f64>,
    ) -> SelectionResult<ScreeningQuery<'_>> {
        let p = self.score.len();
        if perturbation.len() != p {
            return Err(SelectionError::DimensionMismatch {
                context: "perturbation length",
                expected: p,
                found: perturbation.len(),
            });
        }
        let residual = &self.score - &perturbation;
        let signs = Array1::from_shape_fn(p, |j| {
            if residual[j].abs() >= self.thresholds[j] { sign(-residual[j]) } else { 0.0 }
        });
        let event = SelectionEvent::from_signs(signs);
        let selected = event.selected_indices();
        let k = selected.len();

        let mut opt_linear = Array2::<f64>::zeros((p, k));
        let mut opt_offset = -&residual;
        let mut opt_state = Array1::<f64>::zeros(k);
        for (c, &j) in selected.iter().enumerate() {
            let sj = event.signs()[j];
            opt_linear[[j, c]] = sj;
            opt_offset[j] = sj * self.thresholds[j];
            opt_state[c] = residual[j].abs() - self.thresholds[j];
        }
        let decomposition = LinearDecomposition::new(
            AffineTransform::new(opt_linear, opt_offset)?,
            AffineTransform::new(Array2::eye(p), Array1::zeros(p))?,
        )?;

        let precision = self.randomizer.precision();
        let conditional = conditional_gaussian(&decomposition, &self.score.view(), &precision)?;
        let constraints = AffineConstraints::new(
            -Array2::eye(k),
            Array1::zeros(k),
            conditional.mean.clone(),
            conditional.covariance.clone(),
        )?;

        debug!("screening fit: {k} of {p} coordinates selected");

        Ok(ScreeningQuery {
            problem: self,
            perturbation,
            event,
            observed_opt_state: opt_state,
            observed_score_state: self.score.clone(),
            decomposition,
            region: FeasibleRegion::NonNegative { dim: k },
            constraints,
            conditional,
        })
    }
}

/// Fitted, sampler-ready screening selection.
#[derive(Debug, Clone)]
pub struct ScreeningQuery<'a> {
    problem: &'a ScreeningProblem,
    perturbation: Array1<f64>,
    event: SelectionEvent,
    observed_opt_state: Array1<f64>,
    observed_score_state: Array1<f64>,
    decomposition: LinearDecomposition,
    region: FeasibleRegion,
    constraints: AffineConstraints,
    conditional: ConditionalGaussian,
}

fn feature_indices(features: &[bool], p: usize) -> SelectionResult<Vec<usize>> {
    if features.len() != p {
        return Err(SelectionError::DimensionMismatch {
            context: "target features",
            expected: p,
            found: features.len(),
        });
    }
    let idx: Vec<usize> = (0..p).filter(|&j| features[j]).collect();
    if idx.is_empty() {
        return Err(SelectionError::EmptyFeatures);
    }
    Ok(idx)
}

impl ScreeningQuery<'_> {
    pub fn perturbation(&self) -> &Array1<f64> {
        &self.perturbation
    }

    /// multivariate_targets — partial-regression target on `features`.
    ///
    /// With `Q = Σ_EE / dispersion`, the target is `−Q⁻¹ s_E` with
    /// covariance `dispersion · Q⁻¹` and cross-covariance `−Q⁻¹ Σ_E·` with
    /// the score.
    ///
    /// # Errors
    /// - [`SelectionError::DimensionMismatch`] if `features.len() != p`.
    /// - [`SelectionError::EmptyFeatures`] for an empty mask.
    /// - [`SelectionError::InvalidDispersion`] unless `dispersion > 0`.
    /// - [`SelectionError::Linalg`] if `Σ_EE` is singular.
    pub fn multivariate_targets(
        &self, features: &[bool], dispersion: f64,
    ) -> SelectionResult<Target> {
        let sigma = &self.problem.covariance;
        let idx = feature_indices(features, sigma.nrows())?;
        if !dispersion.is_finite() || dispersion <= 0.0 {
            return Err(SelectionError::InvalidDispersion { dispersion });
        }
        let sigma_e = sigma.select(Axis(0), &idx);
        let q = sigma_e.select(Axis(1), &idx) / dispersion;
        let q_inv = spd_inverse(&q.view(), "target precision")?;
        let score_e = self.observed_score_state.select(Axis(0), &idx);
        Ok(Target {
            observed: -q_inv.dot(&score_e),
            covariance: &q_inv * dispersion,
            crosscov: -q_inv.dot(&sigma_e),
            alternatives: vec![Alternative::TwoSided; idx.len()],
        })
    }

    /// marginal_targets — the observed data on `features` itself.
    ///
    /// Target `−s_E`, covariance `Σ_EE`, cross-covariance `−Σ_E·`.
    ///
    /// # Errors
    /// - [`SelectionError::DimensionMismatch`] if `features.len() != p`.
    /// - [`SelectionError::EmptyFeatures`] for an empty mask.
    pub fn marginal_targets(&self, features: &[bool]) -> SelectionResult<Target> {
        let sigma = &self.problem.covariance;
        let idx = feature_indices(features, sigma.nrows())?;
        let sigma_e = sigma.select(Axis(0), &idx);
        Ok(Target {
            observed: -self.observed_score_state.select(Axis(0), &idx),
            covariance: sigma_e.select(Axis(1), &idx),
            crosscov: -sigma_e,
            alternatives: vec![Alternative::TwoSided; idx.len()],
        })
    }
}

impl Query for ScreeningQuery<'_> {
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
    use crate::linalg::min_eigenvalue;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    // Purpose
    // -------
    // The selection indicator follows the closed-form rule |s − ω| ≥ t.
    //
    // Given
    // -----
    // - One coordinate, score 2, threshold 2, isotropic scale 1, a range of
    //   fixed perturbations plus seeded draws.
    //
    // Expect
    // ------
    // - Selected iff |2 − ω| ≥ 2 for every ω.
    fn selection_matches_closed_form_rule() {
        // Arrange
        let problem = ScreeningProblem::from_score(
            array![2.0],
            array![[1.0]],
            Randomizer::isotropic_gaussian(1, 1.0).unwrap(),
            array![2.0],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut omegas = vec![-1.0, -0.01, 0.0, 0.5, 3.9, 4.0, 4.2];
        omegas.extend((0..50).map(|_| problem.randomizer().sample(&mut rng)[0]));

        for omega in omegas {
            // Act
            let query = problem.fit_with_perturbation(array![omega]).unwrap();

            // Assert
            let expected = (2.0_f64 - omega).abs() >= 2.0;
            assert_eq!(query.selection_variable().selected()[0], expected, "omega = {omega}");
        }
    }

    #[test]
    // Purpose
    // -------
    // The decomposition reconstructs ω exactly on selected and unselected
    // rows, and the observed excess is feasible.
    fn decomposition_reconstructs_perturbation() {
        // Arrange
        let problem = ScreeningProblem::new(
            array![3.0, -0.2, -2.5, 0.4],
            Array2::eye(4),
            Randomizer::isotropic_gaussian(4, 1.0).unwrap(),
            array![2.0, 2.0, 2.0, 2.0],
        )
        .unwrap();
        let omega = array![0.3, 0.1, -0.4, -0.2];

        // Act
        let query = problem.fit_with_perturbation(omega.clone()).unwrap();

        // Assert
        assert_eq!(query.selection_variable().selected_indices(), vec![0, 2]);
        assert_eq!(query.selection_variable().signs(), &array![1.0, 0.0, -1.0, 0.0]);
        let rebuilt = query
            .decomposition()
            .reconstruct(&query.observed_opt_state().view(), &query.observed_score_state().view())
            .unwrap();
        for (a, b) in rebuilt.iter().zip(omega.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(query.constraints().is_feasible(&query.observed_opt_state().view(), 0.0).unwrap());
        assert!(min_eigenvalue(&query.conditional().covariance.view()).unwrap() > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Marginal and multivariate targets agree with closed forms.
    //
    // Given
    // -----
    // - Σ = [[2, 0.5], [0.5, 1]], data Z = (1, -1), dispersion 1.
    //
    // Expect
    // ------
    // - Marginal: observed Z, covariance Σ, cross-covariance −Σ.
    // - Multivariate: observed Σ⁻¹ Z, covariance Σ⁻¹.
    fn targets_match_closed_forms() {
        // Arrange
        let sigma = array![[2.0, 0.5], [0.5, 1.0]];
        let problem = ScreeningProblem::new(
            array![1.0, -1.0],
            sigma.clone(),
            Randomizer::isotropic_gaussian(2, 1.0).unwrap(),
            array![1.0, 1.0],
        )
        .unwrap();
        let query = problem.fit_with_perturbation(array![0.0, 0.0]).unwrap();

        // Act
        let marginal = query.marginal_targets(&[true, true]).unwrap();
        let multi = query.multivariate_targets(&[true, true], 1.0).unwrap();

        // Assert
        assert_eq!(marginal.observed, array![1.0, -1.0]);
        assert_eq!(marginal.crosscov, -&sigma);
        let sigma_inv = spd_inverse(&sigma.view(), "test").unwrap();
        let expected = sigma_inv.dot(&array![1.0, -1.0]);
        for j in 0..2 {
            assert!((multi.observed[j] - expected[j]).abs() < 1e-12);
            assert!((multi.covariance[[j, j]] - sigma_inv[[j, j]]).abs() < 1e-12);
        }
        let empty = query.marginal_targets(&[false, false]);
        assert!(matches!(empty, Err(SelectionError::EmptyFeatures)));
    }

    #[test]
    // Purpose
    // -------
    // A Laplace-randomized query samples under the Gaussian moment match of
    // its randomizer.
    //
    // Given
    // -----
    // - Scores (3, 0.1), unit thresholds, Laplace randomizer with b = 0.5,
    //   ω = 0.
    //
    // Expect
    // ------
    // - The sampler density carries precision 1 / (2b²) = 2.
    // - The single selected coordinate has conditional variance 1/2.
    fn laplace_query_samples_under_moment_matched_precision() {
        // Arrange
        let randomizer = Randomizer::laplace(2, 0.5).unwrap();
        let problem =
            ScreeningProblem::new(array![3.0, 0.1], Array2::eye(2), randomizer, array![1.0, 1.0])
                .unwrap();

        // Act
        let query = problem.fit_with_perturbation(array![0.0, 0.0]).unwrap();
        let sampler = query.sampler().unwrap();

        // Assert
        assert_eq!(
            sampler.density().precision(),
            &crate::randomization::RandomizerPrecision::Isotropic(2.0)
        );
        assert_eq!(query.selection_variable().selected(), &[true, false]);
        assert!((query.conditional().covariance[[0, 0]] - 0.5).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // `type1` thresholds use the normal quantile of the randomized sd.
    //
    // Given
    // -----
    // - Σ = diag(1, 3), randomizer scale 1, level 0.05 and level 0.5.
    //
    // Expect
    // ------
    // - t_j = sqrt(Σ_jj + 1) · z_{0.975} to 1e-9; at level 0.5 the quantile
    //   is z_{0.75}.
    // - A level outside (0, 1) is rejected.
    fn type1_thresholds_use_normal_quantile() {
        // Arrange
        let cov = array![[1.0, 0.0], [0.0, 3.0]];
        let z975 = 1.959_963_984_540_054;
        let z75 = 0.674_489_750_196_081_7;

        // Act
        let problem = ScreeningProblem::type1(array![0.0, 0.0], cov.clone(), 1.0, 0.05).unwrap();
        let half = ScreeningProblem::type1(array![0.0, 0.0], cov, 1.0, 0.5).unwrap();

        // Assert
        assert!((problem.thresholds()[0] - 2.0_f64.sqrt() * z975).abs() < 1e-9);
        assert!((problem.thresholds()[1] - 2.0 * z975).abs() < 1e-9);
        assert!((half.thresholds()[1] - 2.0 * z75).abs() < 1e-9);
        assert!(matches!(
            ScreeningProblem::type1(array![0.0], array![[1.0]], 1.0, 1.5),
            Err(SelectionError::InvalidLevel { .. })
        ));
    }
}
