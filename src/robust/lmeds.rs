use std::cell::{Cell, RefCell};

use crate::error::PolyEstimatorError;
use crate::estimator_type::PolynomialEstimatorType;
use crate::listener::EstimatorListener;
use crate::lock::LockGuard;
use crate::observation::Observation;
use crate::polynomial::Polynomial;

use super::common::{self, Sampling, Scoring};

/// Least Median of Squares: uniform random minimal-sample draws, scored by
/// median of squared residuals. Inliers are determined a posteriori from the
/// robust scale estimate of the winning candidate, not a user threshold.
///
/// Every setter takes `&self`: configuration lives behind `Cell`/`RefCell` so
/// that a listener callback, which only ever sees `&LMedSEstimator`, can
/// still attempt a setter call — and observe it rejected with
/// [`PolyEstimatorError::Locked`] while `estimate()` is running.
pub struct LMedSEstimator {
    degree: Cell<usize>,
    observations: RefCell<Vec<Observation>>,
    stop_threshold: Cell<Option<f64>>,
    confidence: Cell<f64>,
    max_iterations: Cell<usize>,
    progress_delta: Cell<f64>,
    use_geometric_distance: Cell<bool>,
    refine_result: Cell<bool>,
    listener: RefCell<Option<Box<dyn EstimatorListener<LMedSEstimator>>>>,
    locked: Cell<bool>,
}

impl LMedSEstimator {
    pub fn new(degree: usize) -> Result<Self, PolyEstimatorError> {
        validate_degree(degree)?;
        Ok(Self {
            degree: Cell::new(degree),
            observations: RefCell::new(Vec::new()),
            stop_threshold: Cell::new(None),
            confidence: Cell::new(0.99),
            max_iterations: Cell::new(1000),
            progress_delta: Cell::new(0.1),
            use_geometric_distance: Cell::new(false),
            refine_result: Cell::new(true),
            listener: RefCell::new(None),
            locked: Cell::new(false),
        })
    }

    pub fn get_type(&self) -> PolynomialEstimatorType {
        PolynomialEstimatorType::LMedS
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    pub fn get_degree(&self) -> usize {
        self.degree.get()
    }

    pub fn set_degree(&self, degree: usize) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        validate_degree(degree)?;
        self.degree.set(degree);
        Ok(())
    }

    pub fn get_evaluations(&self) -> Vec<Observation> {
        self.observations.borrow().clone()
    }

    pub fn set_evaluations(&self, observations: Vec<Observation>) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        *self.observations.borrow_mut() = observations;
        Ok(())
    }

    pub fn get_stop_threshold(&self) -> Option<f64> {
        self.stop_threshold.get()
    }

    /// Bounds the acceptable median-of-squares value for early termination.
    pub fn set_stop_threshold(&self, stop_threshold: Option<f64>) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        if let Some(t) = stop_threshold {
            if !(t > 0.0) {
                return Err(PolyEstimatorError::InvalidConfiguration(
                    "stop_threshold must be > 0".into(),
                ));
            }
        }
        self.stop_threshold.set(stop_threshold);
        Ok(())
    }

    pub fn get_confidence(&self) -> f64 {
        self.confidence.get()
    }

    pub fn set_confidence(&self, confidence: f64) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "confidence must be in (0, 1)".into(),
            ));
        }
        self.confidence.set(confidence);
        Ok(())
    }

    pub fn get_max_iterations(&self) -> usize {
        self.max_iterations.get()
    }

    pub fn set_max_iterations(&self, max_iterations: usize) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        if max_iterations == 0 {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "max_iterations must be > 0".into(),
            ));
        }
        self.max_iterations.set(max_iterations);
        Ok(())
    }

    pub fn get_progress_delta(&self) -> f64 {
        self.progress_delta.get()
    }

    pub fn set_progress_delta(&self, progress_delta: f64) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        if !(progress_delta > 0.0 && progress_delta < 1.0) {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "progress_delta must be in (0, 1)".into(),
            ));
        }
        self.progress_delta.set(progress_delta);
        Ok(())
    }

    pub fn is_geometric_distance_used(&self) -> bool {
        self.use_geometric_distance.get()
    }

    pub fn set_geometric_distance_used(&self, used: bool) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        self.use_geometric_distance.set(used);
        Ok(())
    }

    pub fn is_refine_result(&self) -> bool {
        self.refine_result.get()
    }

    pub fn set_refine_result(&self, refine: bool) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        self.refine_result.set(refine);
        Ok(())
    }

    pub fn set_listener(
        &self,
        listener: Option<Box<dyn EstimatorListener<LMedSEstimator>>>,
    ) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        *self.listener.borrow_mut() = listener;
        Ok(())
    }

    pub fn min_number_of_evaluations(&self) -> usize {
        self.degree.get() + 1
    }

    pub fn is_ready(&self) -> bool {
        self.observations.borrow().len() >= self.min_number_of_evaluations()
    }

    fn reject_if_locked(&self) -> Result<(), PolyEstimatorError> {
        if self.locked.get() {
            Err(PolyEstimatorError::Locked)
        } else {
            Ok(())
        }
    }

    pub fn estimate(&self) -> Result<(Polynomial, Vec<bool>), PolyEstimatorError> {
        if self.locked.get() {
            return Err(PolyEstimatorError::Locked);
        }
        if !self.is_ready() {
            return Err(PolyEstimatorError::NotReady(format!(
                "need at least {} observations, have {}",
                self.min_number_of_evaluations(),
                self.observations.borrow().len()
            )));
        }

        let _guard = LockGuard::acquire(&self.locked);

        if let Some(l) = self.listener.borrow_mut().as_mut() {
            l.on_estimate_start(self);
        }

        let observations = self.observations.borrow();
        let outcome = common::run(
            &observations,
            self.degree.get(),
            Sampling::Uniform,
            Scoring::MedianOfSquares,
            self.confidence.get(),
            self.max_iterations.get(),
            self.progress_delta.get(),
            self.use_geometric_distance.get(),
            self.refine_result.get(),
            self.stop_threshold.get(),
            |it| {
                if let Some(l) = self.listener.borrow_mut().as_mut() {
                    l.on_iteration(self, it);
                }
            },
            |p| {
                if let Some(l) = self.listener.borrow_mut().as_mut() {
                    l.on_progress(self, p);
                }
            },
        );
        drop(observations);

        if let Some(l) = self.listener.borrow_mut().as_mut() {
            l.on_estimate_end(self);
        }

        outcome.map(|o| (o.polynomial, o.inliers))
    }
}

fn validate_degree(degree: usize) -> Result<(), PolyEstimatorError> {
    if degree < 1 {
        Err(PolyEstimatorError::InvalidConfiguration(
            "degree must be >= 1".into(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SetStopThresholdDuringEstimate;

    impl EstimatorListener<LMedSEstimator> for SetStopThresholdDuringEstimate {
        fn on_estimate_start(&mut self, estimator: &LMedSEstimator) {
            let err = estimator.set_stop_threshold(Some(1.0)).unwrap_err();
            assert!(matches!(err, PolyEstimatorError::Locked));
        }
    }

    #[test]
    fn setter_called_from_listener_callback_fails_with_locked() {
        let estimator = LMedSEstimator::new(1).unwrap();
        estimator
            .set_evaluations(vec![
                Observation::direct(0.0, 2.0).unwrap(),
                Observation::direct(1.0, 5.0).unwrap(),
            ])
            .unwrap();
        estimator
            .set_listener(Some(Box::new(SetStopThresholdDuringEstimate)))
            .unwrap();

        assert!(estimator.estimate().is_ok());
        assert_eq!(estimator.get_stop_threshold(), None, "rejected setter must not take effect");
        assert!(!estimator.is_locked());
    }

    #[test]
    fn set_progress_delta_rejects_one() {
        let estimator = LMedSEstimator::new(1).unwrap();
        assert!(estimator.set_progress_delta(1.0).is_err());
    }
}
