use thiserror::Error;

/// Error types for the polynomial estimation engine.
#[derive(Error, Debug)]
pub enum PolyEstimatorError {
    /// A setter rejected its argument (non-positive degree, zero order, mismatched
    /// `constants` length, out-of-range `confidence`/`progress_delta`, etc.).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `estimate()` was called without enough observations for the current degree.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// A configuration setter was called while `estimate()` was in flight.
    #[error("Estimator is locked while estimate() is running")]
    Locked,

    /// The (square or least-squares) linear solve failed: singular or rank-deficient system.
    #[error("Polynomial estimation failed: {0}")]
    PolynomialEstimation(String),

    /// A robust driver exhausted `max_iterations` without finding a viable inlier set.
    #[error("Robust estimation failed: {0}")]
    RobustEstimator(String),

    /// Malformed or truncated binary input.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Wrapper for errors coming from the ndarray-linalg backend.
    #[error("Linear algebra backend error: {0}")]
    LinalgError(#[from] ndarray_linalg::error::LinalgError),
}
