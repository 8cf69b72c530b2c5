//! Smooth objectives for the refit, and their argmin-facing negation.
use argmin::core::{CostFunction, Error, Gradient};
use ndarray::Array1;

use crate::optimization::errors::{OptError, OptResult};

/// Smooth concave objective `f(θ)` to be maximized.
pub trait RefitObjective {
    /// Length of `θ`.
    fn dim(&self) -> usize;

    fn value(&self, theta: &Array1<f64>) -> OptResult<f64>;

    /// `∇f(θ)`, of length [`dim`](Self::dim).
    fn gradient(&self, theta: &Array1<f64>) -> OptResult<Array1<f64>>;
}

/// `−f` as an argmin problem.
#[derive(Debug, Clone, Copy)]
pub struct NegatedObjective<'a, F: ?Sized> {
    objective: &'a F,
}

impl<'a, F: RefitObjective + ?Sized> NegatedObjective<'a, F> {
    pub fn new(objective: &'a F) -> Self {
        Self { objective }
    }
}

impl<F: RefitObjective + ?Sized> CostFunction for NegatedObjective<'_, F> {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, theta: &Array1<f64>) -> Result<f64, Error> {
        let value = self.objective.value(theta)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value }.into());
        }
        Ok(-value)
    }
}

impl<F: RefitObjective + ?Sized> Gradient for NegatedObjective<'_, F> {
    type Param = Array1<f64>;
    type Gradient = Array1<f64>;

    fn gradient(&self, theta: &Array1<f64>) -> Result<Array1<f64>, Error> {
        let grad = self.objective.gradient(theta)?;
        if grad.len() != theta.len() {
            return Err(OptError::DimensionMismatch {
                context: "refit gradient",
                expected: theta.len(),
                found: grad.len(),
            }
            .into());
        }
        if let Some((index, &value)) = grad.iter().enumerate().find(|(_, g)| !g.is_finite()) {
            return Err(OptError::NonFiniteGradient { index, value }.into());
        }
        Ok(-grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // f(θ) = −(θ − 1)², with an optional poisoned gradient.
    struct Parabola {
        poison: bool,
    }

    impl RefitObjective for Parabola {
        fn dim(&self) -> usize {
            1
        }

        fn value(&self, theta: &Array1<f64>) -> OptResult<f64> {
            Ok(-(theta[0] - 1.0).powi(2))
        }

        fn gradient(&self, theta: &Array1<f64>) -> OptResult<Array1<f64>> {
            if self.poison {
                return Ok(array![f64::NAN]);
            }
            Ok(array![-2.0 * (theta[0] - 1.0)])
        }
    }

    #[test]
    // Purpose
    // -------
    // The argmin cost and gradient are the negated objective.
    //
    // Given
    // -----
    // - f(θ) = −(θ − 1)² at θ = 3.
    //
    // Expect
    // ------
    // - cost 4 and cost gradient 4.
    fn negation_flips_value_and_gradient() {
        // Arrange
        let f = Parabola { poison: false };
        let problem = NegatedObjective::new(&f);
        let theta = array![3.0];

        // Act
        let cost = problem.cost(&theta).unwrap();
        let grad = problem.gradient(&theta).unwrap();

        // Assert
        assert!((cost - 4.0).abs() < 1e-14);
        assert!((grad[0] - 4.0).abs() < 1e-14);
    }

    #[test]
    fn non_finite_gradient_is_reported_with_its_index() {
        let f = Parabola { poison: true };
        let err = NegatedObjective::new(&f).gradient(&array![0.0]).unwrap_err();
        assert!(matches!(OptError::from(err), OptError::NonFiniteGradient { index: 0, .. }));
    }
}
