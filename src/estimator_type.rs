/// Which concrete estimator a [`PolynomialEstimatorType`] selects. Returned
/// unchanged by every estimator's `get_type()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolynomialEstimatorType {
    /// Deterministic exact-fit / least-mean-squared-error estimator.
    Lmse,
    /// Weighted least-squares estimator over the top-k observations by weight.
    Weighted,
    /// RANSAC robust estimator.
    Ransac,
    /// Least-Median-of-Squares robust estimator.
    LMedS,
    /// PROSAC robust estimator (quality-guided progressive sampling).
    Prosac,
    /// PROMedS robust estimator (PROSAC sampling + LMedS scoring).
    PROMedS,
}
