use crate::deterministic::DeterministicEstimator;
use crate::error::PolyEstimatorError;
use crate::estimator_type::PolynomialEstimatorType;
use crate::robust::{LMedSEstimator, PROMedSEstimator, ProsacEstimator, RansacEstimator};
use crate::weighted::WeightedEstimator;

/// Any estimator, discriminated by its [`PolynomialEstimatorType`]. Produced
/// by [`create_estimator`]; each common setter still lives on the concrete
/// type once matched out, since the six estimators don't share a method
/// signature beyond `get_type`/`get_degree`/`is_locked`.
pub enum PolynomialEstimator {
    Lmse(DeterministicEstimator),
    Weighted(WeightedEstimator),
    Ransac(RansacEstimator),
    LMedS(LMedSEstimator),
    Prosac(ProsacEstimator),
    PROMedS(PROMedSEstimator),
}

impl PolynomialEstimator {
    pub fn get_type(&self) -> PolynomialEstimatorType {
        match self {
            PolynomialEstimator::Lmse(e) => e.get_type(),
            PolynomialEstimator::Weighted(e) => e.get_type(),
            PolynomialEstimator::Ransac(e) => e.get_type(),
            PolynomialEstimator::LMedS(e) => e.get_type(),
            PolynomialEstimator::Prosac(e) => e.get_type(),
            PolynomialEstimator::PROMedS(e) => e.get_type(),
        }
    }

    pub fn get_degree(&self) -> usize {
        match self {
            PolynomialEstimator::Lmse(e) => e.get_degree(),
            PolynomialEstimator::Weighted(e) => e.get_degree(),
            PolynomialEstimator::Ransac(e) => e.get_degree(),
            PolynomialEstimator::LMedS(e) => e.get_degree(),
            PolynomialEstimator::Prosac(e) => e.get_degree(),
            PolynomialEstimator::PROMedS(e) => e.get_degree(),
        }
    }
}

/// Discriminated constructor: builds the estimator named by `estimator_type`
/// at the given `degree`, forwarding only the configuration common to every
/// subtype. Callers downcast via the returned enum's variant to reach each
/// subtype's extra setters (threshold, quality scores, and so on).
pub fn create_estimator(
    estimator_type: PolynomialEstimatorType,
    degree: usize,
) -> Result<PolynomialEstimator, PolyEstimatorError> {
    Ok(match estimator_type {
        PolynomialEstimatorType::Lmse => {
            PolynomialEstimator::Lmse(DeterministicEstimator::new(degree)?)
        }
        PolynomialEstimatorType::Weighted => {
            PolynomialEstimator::Weighted(WeightedEstimator::new(degree)?)
        }
        PolynomialEstimatorType::Ransac => {
            PolynomialEstimator::Ransac(RansacEstimator::new(degree)?)
        }
        PolynomialEstimatorType::LMedS => {
            PolynomialEstimator::LMedS(LMedSEstimator::new(degree)?)
        }
        PolynomialEstimatorType::Prosac => {
            PolynomialEstimator::Prosac(ProsacEstimator::new(degree)?)
        }
        PolynomialEstimatorType::PROMedS => {
            PolynomialEstimator::PROMedS(PROMedSEstimator::new(degree)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_preserves_requested_type_and_degree() {
        let estimator = create_estimator(PolynomialEstimatorType::Ransac, 3).unwrap();
        assert_eq!(estimator.get_type(), PolynomialEstimatorType::Ransac);
        assert_eq!(estimator.get_degree(), 3);
    }

    #[test]
    fn factory_rejects_invalid_degree() {
        assert!(create_estimator(PolynomialEstimatorType::Lmse, 0).is_err());
    }
}
