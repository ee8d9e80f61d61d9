use std::cell::{Cell, RefCell};

use crate::error::PolyEstimatorError;
use crate::estimator_type::PolynomialEstimatorType;
use crate::linear_system::LinearSystemBuilder;
use crate::listener::EstimatorListener;
use crate::lock::LockGuard;
use crate::observation::Observation;
use crate::polynomial::Polynomial;
use crate::solve::{solve_least_squares, solve_square};

/// Solves `A·p = b` exactly (square system) or, when allowed and
/// overdetermined, in the least-mean-squared-error sense.
///
/// Every setter takes `&self`: configuration lives behind `Cell`/`RefCell` so
/// that a listener callback, which only ever sees `&DeterministicEstimator`,
/// can still attempt a setter call — and observe it rejected with
/// [`PolyEstimatorError::Locked`] while `estimate()` is running.
pub struct DeterministicEstimator {
    degree: Cell<usize>,
    observations: RefCell<Vec<Observation>>,
    lmse_allowed: Cell<bool>,
    listener: RefCell<Option<Box<dyn EstimatorListener<DeterministicEstimator>>>>,
    locked: Cell<bool>,
}

impl DeterministicEstimator {
    pub fn new(degree: usize) -> Result<Self, PolyEstimatorError> {
        validate_degree(degree)?;
        Ok(Self {
            degree: Cell::new(degree),
            observations: RefCell::new(Vec::new()),
            lmse_allowed: Cell::new(true),
            listener: RefCell::new(None),
            locked: Cell::new(false),
        })
    }

    pub fn get_type(&self) -> PolynomialEstimatorType {
        PolynomialEstimatorType::Lmse
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

    pub fn is_lmse_solution_allowed(&self) -> bool {
        self.lmse_allowed.get()
    }

    pub fn set_lmse_solution_allowed(&self, allowed: bool) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        self.lmse_allowed.set(allowed);
        Ok(())
    }

    pub fn set_listener(
        &self,
        listener: Option<Box<dyn EstimatorListener<DeterministicEstimator>>>,
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

    pub fn estimate(&self) -> Result<Polynomial, PolyEstimatorError> {
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

        let result = {
            let observations = self.observations.borrow();
            solve_deterministic(&observations, self.degree.get(), self.lmse_allowed.get())
        };

        if let Some(l) = self.listener.borrow_mut().as_mut() {
            l.on_estimate_end(self);
        }

        result
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

/// Solves `degree`'s minimal or overdetermined system for `observations`.
/// Shared by [`DeterministicEstimator::estimate`] and every robust driver's
/// per-iteration inner solve (degree `d`, LMSE never allowed there).
pub(crate) fn solve_deterministic(
    observations: &[Observation],
    degree: usize,
    lmse_allowed: bool,
) -> Result<Polynomial, PolyEstimatorError> {
    let min_evaluations = degree + 1;
    let use_square = !lmse_allowed || observations.len() == min_evaluations;

    if use_square {
        if observations.len() < min_evaluations {
            return Err(PolyEstimatorError::NotReady(format!(
                "need at least {} observations, have {}",
                min_evaluations,
                observations.len()
            )));
        }
        let subset = &observations[..min_evaluations];
        let (a, b) = LinearSystemBuilder::build(subset, degree)?;
        let p = solve_square(&a, &b)?;
        Polynomial::new(p.to_vec())
    } else {
        let (a, b) = LinearSystemBuilder::build(observations, degree)?;
        let p = solve_least_squares(&a, &b)?;
        Polynomial::new(p.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_degree_zero() {
        assert!(DeterministicEstimator::new(0).is_err());
    }

    #[test]
    fn is_not_locked_before_estimate() {
        let estimator = DeterministicEstimator::new(1).unwrap();
        assert!(!estimator.is_locked());
    }

    #[test]
    fn is_not_locked_after_successful_estimate() {
        let estimator = DeterministicEstimator::new(1).unwrap();
        estimator
            .set_evaluations(vec![
                Observation::direct(0.0, 1.0).unwrap(),
                Observation::direct(1.0, 2.0).unwrap(),
            ])
            .unwrap();
        assert!(estimator.estimate().is_ok());
        assert!(!estimator.is_locked());
    }

    #[test]
    fn lmse_disabled_requires_exactly_minimal_sample() {
        let estimator = DeterministicEstimator::new(1).unwrap();
        estimator.set_lmse_solution_allowed(false).unwrap();
        estimator
            .set_evaluations(vec![
                Observation::direct(0.0, 1.0).unwrap(),
                Observation::direct(1.0, 2.0).unwrap(),
                Observation::direct(2.0, 3.0).unwrap(),
            ])
            .unwrap();
        // Three observations but LMSE disabled: solve_deterministic should
        // still succeed by using only the first `degree + 1` of them.
        assert!(estimator.estimate().is_ok());
    }

    struct SetDegreeDuringEstimate;

    impl EstimatorListener<DeterministicEstimator> for SetDegreeDuringEstimate {
        fn on_estimate_start(&mut self, estimator: &DeterministicEstimator) {
            let err = estimator.set_degree(2).unwrap_err();
            assert!(matches!(err, PolyEstimatorError::Locked));
        }
    }

    #[test]
    fn setter_called_from_listener_callback_fails_with_locked() {
        let estimator = DeterministicEstimator::new(1).unwrap();
        estimator
            .set_evaluations(vec![
                Observation::direct(0.0, 2.0).unwrap(),
                Observation::direct(1.0, 5.0).unwrap(),
            ])
            .unwrap();
        estimator
            .set_listener(Some(Box::new(SetDegreeDuringEstimate)))
            .unwrap();

        assert!(estimator.estimate().is_ok());
        assert_eq!(estimator.get_degree(), 1, "rejected setter must not take effect");
        assert!(!estimator.is_locked());
    }
}
