use ndarray::Array2;
use ndarray_linalg::Eig;

use crate::error::PolyEstimatorError;
use crate::factorial::{factorial, falling_factorial, rising_factorial_inverse};

/// A tolerance below which a companion-matrix eigenvalue's imaginary part is
/// treated as numerical noise and the eigenvalue accepted as a real root.
const REAL_ROOT_TOLERANCE: f64 = 1e-9;

/// A real-coefficient univariate polynomial `P(x) = Σ coefficients[i] * x^i`,
/// lowest-order coefficient first. Degree is `coefficients.len() - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Builds a polynomial from its coefficients, lowest order first.
    /// `coefficients.len() - 1` is the declared degree, regardless of whether
    /// the highest-order coefficients happen to be zero. A bare constant
    /// (degree 0) is accepted here since intermediate results of polynomial
    /// arithmetic (derivatives, residual-equation construction) routinely
    /// degenerate to one; estimators enforce the stronger `degree >= 1`
    /// invariant on their own `set_degree` input instead.
    pub fn new(coefficients: Vec<f64>) -> Result<Self, PolyEstimatorError> {
        if coefficients.is_empty() {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "a polynomial needs at least one coefficient".into(),
            ));
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "polynomial coefficients must be finite".into(),
            ));
        }
        Ok(Self { coefficients })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// `P(x)`.
    pub fn evaluate(&self, x: f64) -> f64 {
        // Horner's method.
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    /// The `order`-th derivative of `P`, as its own polynomial. A derivative
    /// of order `>= coefficients.len()` degenerates to the zero (constant)
    /// polynomial.
    pub fn derivative(&self, order: usize) -> Polynomial {
        let d = self.degree();
        let mut coeffs = vec![0.0; d + 1];
        for j in 0..=d {
            if j >= order {
                coeffs[j - order] = falling_factorial(j, order) * self.coefficients[j];
            }
        }
        Polynomial { coefficients: coeffs }
    }

    /// `P^(order)(x)`.
    pub fn evaluate_derivative(&self, x: f64, order: usize) -> f64 {
        self.derivative(order).evaluate(x)
    }

    /// The `order`-th indefinite integral of `P`, given the `order`
    /// integration constants (lowest-order integration step first).
    pub fn integral(&self, order: usize, constants: &[f64]) -> Result<Polynomial, PolyEstimatorError> {
        if order == 0 {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "integral order must be >= 1".into(),
            ));
        }
        if constants.len() != order {
            return Err(PolyEstimatorError::InvalidConfiguration(format!(
                "expected {} integration constants, got {}",
                order,
                constants.len()
            )));
        }
        let d = self.degree();
        let mut coeffs = vec![0.0; d + order + 1];
        for j in 0..=d {
            coeffs[j + order] = rising_factorial_inverse(j, order) * self.coefficients[j];
        }
        // constants[i] was introduced at integration step (i+1) of `order` and
        // is carried through (order-1-i) further integrations, so it lands on
        // the x^(order-1-i) term scaled by that many integrations of a constant.
        for (i, &c) in constants.iter().enumerate() {
            let power = order - 1 - i;
            coeffs[power] += c / factorial(power);
        }
        Ok(Polynomial { coefficients: coeffs })
    }

    /// `I(x)` where `I` is the `order`-th indefinite integral with the given constants.
    pub fn evaluate_integral(
        &self,
        x: f64,
        order: usize,
        constants: &[f64],
    ) -> Result<f64, PolyEstimatorError> {
        Ok(self.integral(order, constants)?.evaluate(x))
    }

    /// `∫_{start_x}^{end_x} ... order-fold ... P`.
    pub fn evaluate_integral_interval(
        &self,
        start_x: f64,
        end_x: f64,
        order: usize,
        constants: &[f64],
    ) -> Result<f64, PolyEstimatorError> {
        let antiderivative = self.integral(order, constants)?;
        Ok(antiderivative.evaluate(end_x) - antiderivative.evaluate(start_x))
    }

    /// `self + other`, padding the shorter operand with zeros.
    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let len = self.coefficients.len().max(other.coefficients.len());
        let mut coeffs = vec![0.0; len];
        for (i, c) in self.coefficients.iter().enumerate() {
            coeffs[i] += c;
        }
        for (i, c) in other.coefficients.iter().enumerate() {
            coeffs[i] += c;
        }
        Polynomial { coefficients: coeffs }
    }

    /// `self * scalar`.
    pub fn scale(&self, scalar: f64) -> Polynomial {
        Polynomial {
            coefficients: self.coefficients.iter().map(|c| c * scalar).collect(),
        }
    }

    /// Adds a scalar to the constant term.
    pub fn add_scalar(&self, scalar: f64) -> Polynomial {
        let mut coeffs = self.coefficients.clone();
        coeffs[0] += scalar;
        Polynomial { coefficients: coeffs }
    }

    /// `self * other`, via convolution of coefficients.
    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut coeffs = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            for (j, &b) in other.coefficients.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial { coefficients: coeffs }
    }

    /// Real roots of this polynomial, found via the eigenvalues of its
    /// companion matrix. Used only by the geometric residual's root-finding
    /// step; a companion-matrix eigenvalue is accepted as real when its
    /// imaginary part is within [`REAL_ROOT_TOLERANCE`] of zero.
    pub fn real_roots(&self) -> Result<Vec<f64>, PolyEstimatorError> {
        // Strip trailing (highest-order) zero coefficients so the leading
        // coefficient used to build the companion matrix is nonzero.
        let mut trimmed = self.coefficients.clone();
        while trimmed.len() > 1 && trimmed.last() == Some(&0.0) {
            trimmed.pop();
        }
        let n = trimmed.len() - 1;
        if n == 0 {
            return Ok(Vec::new());
        }
        let leading = trimmed[n];
        let monic: Vec<f64> = trimmed[..n].iter().map(|&c| c / leading).collect();

        // Standard companion matrix: subdiagonal of ones, last column holds
        // the negated monic coefficients.
        let mut companion = Array2::<f64>::zeros((n, n));
        for i in 1..n {
            companion[[i, i - 1]] = 1.0;
        }
        for i in 0..n {
            companion[[i, n - 1]] = -monic[i];
        }

        let (eigvals, _) = companion.eig()?;
        Ok(eigvals
            .iter()
            .filter(|ev| ev.im.abs() <= REAL_ROOT_TOLERANCE)
            .map(|ev| ev.re)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_matches_horner_reference() {
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]).unwrap(); // 1 + 2x + 3x^2
        assert!((p.evaluate(2.0) - 17.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_of_cubic_matches_analytical_quadratic() {
        let p = Polynomial::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap(); // 1+2x+3x^2+4x^3
        let dp = p.derivative(1); // 2 + 6x + 12x^2
        assert_eq!(dp.coefficients(), &[2.0, 6.0, 12.0]);
    }

    #[test]
    fn second_derivative_matches_analytical_formula() {
        let p = Polynomial::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let d2p = p.derivative(2); // 6 + 24x
        assert_eq!(d2p.coefficients(), &[6.0, 24.0]);
    }

    #[test]
    fn integral_then_derivative_is_identity() {
        let p = Polynomial::new(vec![4.0, 5.0]).unwrap(); // 4 + 5x
        let q = p.integral(1, &[7.0]).unwrap(); // 7 + 4x + 2.5x^2
        assert_eq!(q.coefficients(), &[7.0, 4.0, 2.5]);
        let back = q.derivative(1);
        assert_eq!(back.coefficients(), p.coefficients());
    }

    #[test]
    fn evaluate_integral_interval_matches_fundamental_theorem() {
        let p = Polynomial::new(vec![0.0, 1.0]).unwrap(); // x
        // integral of x from 0 to 2 is 2
        let value = p.evaluate_integral_interval(0.0, 2.0, 1, &[]).unwrap();
        assert!((value - 2.0).abs() < 1e-10);
    }

    #[test]
    fn real_roots_of_quadratic_with_two_real_roots() {
        // x^2 - 3x + 2 = (x-1)(x-2)
        let p = Polynomial::new(vec![2.0, -3.0, 1.0]).unwrap();
        let mut roots = p.real_roots().unwrap();
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 1.0).abs() < 1e-8);
        assert!((roots[1] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn real_roots_of_quadratic_with_no_real_roots_is_empty() {
        // x^2 + 1 has no real roots.
        let p = Polynomial::new(vec![1.0, 0.0, 1.0]).unwrap();
        assert!(p.real_roots().unwrap().is_empty());
    }

    #[test]
    fn new_rejects_empty_coefficients() {
        assert!(Polynomial::new(vec![]).is_err());
    }

    #[test]
    fn new_rejects_non_finite_coefficients() {
        assert!(Polynomial::new(vec![f64::NAN]).is_err());
        assert!(Polynomial::new(vec![f64::INFINITY]).is_err());
    }

    #[test]
    fn mul_matches_convolution_by_hand() {
        let a = Polynomial::new(vec![1.0, 1.0]).unwrap(); // 1 + x
        let b = Polynomial::new(vec![1.0, -1.0]).unwrap(); // 1 - x
        let product = a.mul(&b); // 1 - x^2
        assert_eq!(product.coefficients(), &[1.0, 0.0, -1.0]);
    }
}
