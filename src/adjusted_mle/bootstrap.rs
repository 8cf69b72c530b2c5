//! adjusted_mle::bootstrap — nonparametric bootstrap through a fixed MLE map.
//!
//! Rows of the data are resampled with replacement, the target statistic is
//! recomputed on each resample, and the already-built [`MleMap`] turns it
//! into an estimate. The selective problem is never re-solved, so a
//! thousand replicates cost a thousand barrier solves and nothing more.
use log::debug;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use crate::adjusted_mle::{
    errors::{MleError, MleResult},
    selective_mle::MleMap,
};

/// bootstrap_mle — `n_boot × k` matrix of bootstrap MLE replicates.
///
/// Parameters
/// ----------
/// - `map`: map from an observed target to its selective MLE.
/// - `data`: `n × m` data, one observation per row.
/// - `statistic`: computes the length-`k` target from a resampled data
///   matrix.
/// - `n_boot`: number of replicates.
/// - `rng`: resampling randomness.
///
/// Errors
/// ------
/// - [`MleError::EmptyData`] if `data` has no rows.
/// - [`MleError::DimensionMismatch`] if `statistic` does not return `k`
///   values.
/// - Barrier-solver errors from [`MleMap::apply`].
pub fn bootstrap_mle<F, R>(
    map: &MleMap, data: &ArrayView2<f64>, statistic: F, n_boot: usize, rng: &mut R,
) -> MleResult<Array2<f64>>
where
    F: Fn(&ArrayView2<f64>) -> Array1<f64>,
    R: Rng + ?Sized,
{
    let n = data.nrows();
    if n == 0 {
        return Err(MleError::EmptyData);
    }
    let k = map.target_dim();
    let mut replicates = Array2::<f64>::zeros((n_boot, k));
    let mut indices = vec![0usize; n];
    for mut row in replicates.rows_mut() {
        for idx in indices.iter_mut() {
            *idx = rng.gen_range(0..n);
        }
        let resample = data.select(Axis(0), &indices);
        let target = statistic(&resample.view());
        if target.len() != k {
            return Err(MleError::DimensionMismatch {
                context: "bootstrap statistic",
                expected: k,
                found: target.len(),
            });
        }
        let (estimate, _) = map.apply(&target.view())?;
        row.assign(&estimate);
    }
    debug!("Bootstrap MLE: {n_boot} replicates from {n} rows");
    Ok(replicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adjusted_mle::selective_mle::solve_umvu, randomization::RandomizerPrecision,
        selection::decomposition::AffineTransform,
    };
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    fn scaled_sum(x: &ArrayView2<f64>) -> Array1<f64> {
        array![x.column(0).sum() / (x.nrows() as f64).sqrt()]
    }

    #[test]
    // Purpose
    // -------
    // Bootstrap replicates of the MLE centre on the plug-in estimate.
    //
    // Given
    // -----
    // - n = 100 draws from N(0.45, 1); target Z = Σ xᵢ / √n, well above
    //   the threshold of 2, where the MLE map is close to linear.
    //
    // Expect
    // ------
    // - B = 1000 replicates with mean within 0.25 of the plug-in MLE.
    fn bootstrap_mean_tracks_plug_in() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(2024);
        let normal = Normal::new(0.45, 1.0).unwrap();
        let data = Array2::from_shape_fn((100, 1), |_| normal.sample(&mut rng));
        let observed = scaled_sum(&data.view());
        let mle = solve_umvu(
            &AffineTransform::new(array![[-1.0]], array![0.0]).unwrap(),
            &AffineTransform::new(array![[1.0]], array![2.0]).unwrap(),
            &observed.view(),
            &array![1.0].view(),
            &array![[1.0]].view(),
            &RandomizerPrecision::Isotropic(1.0),
        )
        .unwrap();

        // Act
        let boot = bootstrap_mle(&mle.map, &data.view(), scaled_sum, 1000, &mut rng).unwrap();

        // Assert
        assert_eq!(boot.dim(), (1000, 1));
        let mean = boot.column(0).mean().unwrap();
        assert!((mean - mle.estimate[0]).abs() < 0.25, "mean {mean} vs {}", mle.estimate[0]);
    }

    #[test]
    fn empty_data_is_rejected() {
        let mle = solve_umvu(
            &AffineTransform::new(array![[-1.0]], array![0.0]).unwrap(),
            &AffineTransform::new(array![[1.0]], array![2.0]).unwrap(),
            &array![2.0].view(),
            &array![1.0].view(),
            &array![[1.0]].view(),
            &RandomizerPrecision::Isotropic(1.0),
        )
        .unwrap();
        let data = Array2::<f64>::zeros((0, 1));
        let res = bootstrap_mle(
            &mle.map,
            &data.view(),
            |x| array![x.sum()],
            10,
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(res, Err(MleError::EmptyData)));
    }
}
