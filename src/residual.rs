use crate::error::PolyEstimatorError;
use crate::observation::Observation;
use crate::polynomial::Polynomial;

/// Which notion of "distance between a candidate polynomial and an
/// observation" a robust driver scores against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualMode {
    /// `|predicted - measured|`.
    Algebraic,
    /// Shortest Euclidean distance from the observation point to the curve
    /// `y = P(x)`, for `Direct` observations only. Falls back to the
    /// algebraic residual for every other variant.
    Geometric,
}

pub struct ResidualModel;

impl ResidualModel {
    pub fn residual(
        poly: &Polynomial,
        obs: &Observation,
        mode: ResidualMode,
    ) -> Result<f64, PolyEstimatorError> {
        match mode {
            ResidualMode::Algebraic => Self::algebraic(poly, obs),
            ResidualMode::Geometric => match obs {
                Observation::Direct { x, y } => Self::geometric(poly, *x, *y),
                _ => Self::algebraic(poly, obs),
            },
        }
    }

    fn algebraic(poly: &Polynomial, obs: &Observation) -> Result<f64, PolyEstimatorError> {
        let residual = match obs {
            Observation::Direct { x, y } => poly.evaluate(*x) - y,
            Observation::Derivative { x, y, order } => poly.evaluate_derivative(*x, *order) - y,
            Observation::Integral {
                x,
                y,
                order,
                constants,
            } => {
                let empty = Vec::new();
                poly.evaluate_integral(*x, *order, constants.as_ref().unwrap_or(&empty))? - y
            }
            Observation::IntegralInterval {
                start_x,
                end_x,
                y,
                order,
                constants,
            } => {
                let empty = Vec::new();
                poly.evaluate_integral_interval(
                    *start_x,
                    *end_x,
                    *order,
                    constants.as_ref().unwrap_or(&empty),
                )? - y
            }
        };
        Ok(residual.abs())
    }

    /// Shortest distance from `(x, y)` to the curve `t -> (t, P(t))`: the
    /// minimum of `sqrt((t-x)^2 + (P(t)-y)^2)` over the real roots of
    /// `(t - x) + (P(t) - y) * P'(t) = 0` (the stationary-point condition for
    /// the squared distance).
    fn geometric(poly: &Polynomial, x: f64, y: f64) -> Result<f64, PolyEstimatorError> {
        let p_prime = poly.derivative(1);
        // (P(t) - y) as its own polynomial.
        let shifted = poly.add_scalar(-y);
        // (t - x): degree-1 polynomial in t.
        let identity_minus_x = Polynomial::new(vec![-x, 1.0])?;

        let equation = identity_minus_x.add(&shifted.mul(&p_prime));
        let roots = equation.real_roots()?;

        if roots.is_empty() {
            // Degenerate (e.g. a constant polynomial): fall back to the
            // vertical distance, which is exact when P' is identically zero.
            return Ok((poly.evaluate(x) - y).abs());
        }

        let min_distance = roots
            .iter()
            .map(|&t| {
                let dx = t - x;
                let dy = poly.evaluate(t) - y;
                (dx * dx + dy * dy).sqrt()
            })
            .fold(f64::INFINITY, f64::min);
        Ok(min_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_residual_on_direct_observation() {
        let poly = Polynomial::new(vec![1.0, 2.0]).unwrap(); // 1 + 2x
        let obs = Observation::direct(3.0, 10.0).unwrap(); // P(3) = 7
        let r = ResidualModel::residual(&poly, &obs, ResidualMode::Algebraic).unwrap();
        assert!((r - 3.0).abs() < 1e-12);
    }

    #[test]
    fn geometric_residual_on_point_exactly_on_curve_is_zero() {
        let poly = Polynomial::new(vec![1.0, 2.0]).unwrap();
        let obs = Observation::direct(3.0, poly.evaluate(3.0)).unwrap();
        let r = ResidualModel::residual(&poly, &obs, ResidualMode::Geometric).unwrap();
        assert!(r < 1e-8);
    }

    #[test]
    fn geometric_residual_falls_back_to_algebraic_for_non_direct_variants() {
        let poly = Polynomial::new(vec![1.0, 2.0]).unwrap();
        let obs = Observation::derivative(3.0, 2.0, 1).unwrap();
        let geometric = ResidualModel::residual(&poly, &obs, ResidualMode::Geometric).unwrap();
        let algebraic = ResidualModel::residual(&poly, &obs, ResidualMode::Algebraic).unwrap();
        assert_eq!(geometric, algebraic);
    }
}
