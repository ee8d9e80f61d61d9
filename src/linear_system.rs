use ndarray::{Array1, Array2};

use crate::error::PolyEstimatorError;
use crate::observation::Observation;

/// Translates a sequence of observations into a coefficient matrix `A` and
/// right-hand-side vector `b` for a polynomial of declared degree `d`.
pub struct LinearSystemBuilder;

impl LinearSystemBuilder {
    /// `build(observations, d) -> (A, b)`. Row `i` of `A`/`b` is determined
    /// solely by `observations[i]` and `d`; row order matches observation
    /// order.
    pub fn build(
        observations: &[Observation],
        d: usize,
    ) -> Result<(Array2<f64>, Array1<f64>), PolyEstimatorError> {
        if observations.is_empty() {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "observations must be non-empty".into(),
            ));
        }
        if d < 1 {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "degree must be >= 1".into(),
            ));
        }

        let n = observations.len();
        let mut a = Array2::<f64>::zeros((n, d + 1));
        let mut b = Array1::<f64>::zeros(n);

        for (i, obs) in observations.iter().enumerate() {
            let (row, rhs) = obs.row(d);
            for (j, value) in row.into_iter().enumerate() {
                a[[i, j]] = value;
            }
            b[i] = rhs;
        }

        Ok((a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_empty_observations() {
        assert!(LinearSystemBuilder::build(&[], 1).is_err());
    }

    #[test]
    fn build_rejects_degree_zero() {
        let obs = vec![Observation::direct(0.0, 1.0).unwrap()];
        assert!(LinearSystemBuilder::build(&obs, 0).is_err());
    }

    #[test]
    fn build_stacks_rows_in_observation_order() {
        let obs = vec![
            Observation::direct(0.0, 1.0).unwrap(),
            Observation::direct(1.0, 2.0).unwrap(),
        ];
        let (a, b) = LinearSystemBuilder::build(&obs, 1).unwrap();
        assert_eq!(a.shape(), &[2, 2]);
        assert_eq!(a[[0, 0]], 1.0);
        assert_eq!(a[[0, 1]], 0.0);
        assert_eq!(a[[1, 0]], 1.0);
        assert_eq!(a[[1, 1]], 1.0);
        assert_eq!(b[0], 1.0);
        assert_eq!(b[1], 2.0);
    }
}
