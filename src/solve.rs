use ndarray::{Array1, Array2};
use ndarray_linalg::{LeastSquaresSvd, Solve};

use crate::error::PolyEstimatorError;

/// Solves the square system `a * p = b` exactly via LU decomposition.
/// Fails with [`PolyEstimatorError::PolynomialEstimation`] on a singular matrix.
pub fn solve_square(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, PolyEstimatorError> {
    a.solve(b)
        .map_err(|e| PolyEstimatorError::PolynomialEstimation(format!("singular system: {e}")))
}

/// Solves the overdetermined system `a * p ≈ b` in the least-squares sense
/// (minimizing `‖a·p − b‖₂`) via SVD. Fails with
/// [`PolyEstimatorError::PolynomialEstimation`] when the system is rank-deficient.
pub fn solve_least_squares(
    a: &Array2<f64>,
    b: &Array1<f64>,
) -> Result<Array1<f64>, PolyEstimatorError> {
    let result = a
        .least_squares(b)
        .map_err(|e| PolyEstimatorError::PolynomialEstimation(format!("least-squares solve failed: {e}")))?;
    if result.rank < a.ncols() {
        return Err(PolyEstimatorError::PolynomialEstimation(format!(
            "rank-deficient system: rank {} < {} unknowns",
            result.rank,
            a.ncols()
        )));
    }
    Ok(result.solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn solve_square_recovers_exact_linear_system() {
        let a = array![[1.0, 0.0], [1.0, 1.0]];
        let b = array![2.0, 5.0];
        let p = solve_square(&a, &b).unwrap();
        assert!((p[0] - 2.0).abs() < 1e-12);
        assert!((p[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn solve_square_fails_on_singular_matrix() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let b = array![1.0, 1.0];
        assert!(solve_square(&a, &b).is_err());
    }

    #[test]
    fn solve_least_squares_fits_overdetermined_system() {
        let a = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]];
        let b = array![1.0, 2.0, 3.0];
        let p = solve_least_squares(&a, &b).unwrap();
        assert!((p[0] - 1.0).abs() < 1e-10);
        assert!((p[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn solve_least_squares_fails_on_rank_deficient_system() {
        let a = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let b = array![1.0, 2.0, 3.0];
        assert!(solve_least_squares(&a, &b).is_err());
    }
}
