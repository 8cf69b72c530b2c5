//! Error surface for dense linear-algebra helpers.
//!
//! Every factorization in the crate goes through [`crate::linalg`], so a
//! singular conditional precision, a rank-deficient optimization transform,
//! or a non-conformable product is reported here exactly once and then
//! converted into the caller's error type via `From`.

/// Result alias for linear-algebra helpers.
pub type LinalgResult<T> = Result<T, LinalgError>;

/// LinalgError — failures of dense factorizations and shape checks.
///
/// Variants
/// --------
/// - `NotSquare`
///   A routine that needs a square matrix received `rows × cols`.
/// - `NotPositiveDefinite`
///   Cholesky factorization failed; the matrix is singular or indefinite.
///   `context` names the quantity being factorized (e.g. "conditional
///   precision").
/// - `DimensionMismatch`
///   Two operands are not conformable.
/// - `NonFinite`
///   An input entry is NaN or ±∞.
/// - `NotSymmetric`
///   A matrix that must be symmetric deviates by more than the tolerance.
#[derive(Debug, Clone, PartialEq)]
pub enum LinalgError {
    NotSquare { rows: usize, cols: usize },
    NotPositiveDefinite { context: &'static str, dim: usize },
    DimensionMismatch { context: &'static str, expected: usize, found: usize },
    NonFinite { context: &'static str, row: usize, col: usize, value: f64 },
    NotSymmetric { context: &'static str, asymmetry: f64 },
}

impl std::error::Error for LinalgError {}

impl std::fmt::Display for LinalgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinalgError::NotSquare { rows, cols } => {
                write!(f, "Matrix must be square, found {rows} x {cols}")
            }
            LinalgError::NotPositiveDefinite { context, dim } => {
                write!(f, "{context} ({dim} x {dim}) is not positive definite")
            }
            LinalgError::DimensionMismatch { context, expected, found } => {
                write!(f, "Dimension mismatch in {context}: expected {expected}, found {found}")
            }
            LinalgError::NonFinite { context, row, col, value } => {
                write!(f, "Non-finite entry in {context} at ({row}, {col}): {value}")
            }
            LinalgError::NotSymmetric { context, asymmetry } => {
                write!(f, "{context} is not symmetric (max asymmetry {asymmetry})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Check that `Display` embeds the factorized quantity and its size.
    //
    // Given
    // -----
    // - A `NotPositiveDefinite` error for a 3 × 3 conditional precision.
    //
    // Expect
    // ------
    // - The message mentions both the context string and the dimension.
    fn not_positive_definite_display_names_context_and_dimension() {
        // Arrange
        let err = LinalgError::NotPositiveDefinite { context: "conditional precision", dim: 3 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("conditional precision"));
        assert!(msg.contains("3 x 3"));
    }
}
