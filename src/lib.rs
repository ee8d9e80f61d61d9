pub mod deterministic;
pub mod error;
pub mod estimator_type;
pub mod factorial;
pub mod factory;
pub mod linear_system;
pub mod listener;
mod lock;
pub mod observation;
pub mod polynomial;
pub mod residual;
pub mod robust;
pub mod serialization;
pub mod solve;
pub mod weighted;

pub use deterministic::DeterministicEstimator;
pub use error::PolyEstimatorError;
pub use estimator_type::PolynomialEstimatorType;
pub use factory::{create_estimator, PolynomialEstimator};
pub use listener::EstimatorListener;
pub use observation::Observation;
pub use polynomial::Polynomial;
pub use residual::{ResidualMode, ResidualModel};
pub use robust::{LMedSEstimator, PROMedSEstimator, ProsacEstimator, RansacEstimator};
pub use serialization::{
    deserialize_observation, deserialize_polynomial, serialize_observation, serialize_polynomial,
};
pub use weighted::WeightedEstimator;
