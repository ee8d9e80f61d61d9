use std::cell::{Cell, RefCell};

use crate::error::PolyEstimatorError;
use crate::estimator_type::PolynomialEstimatorType;
use crate::linear_system::LinearSystemBuilder;
use crate::listener::EstimatorListener;
use crate::lock::LockGuard;
use crate::observation::Observation;
use crate::polynomial::Polynomial;
use crate::solve::solve_least_squares;

/// Selects the highest-weighted subset of observations, row-scales them by
/// `weight / max_weight`, and solves the resulting system in the
/// least-squares sense.
///
/// Every setter takes `&self`: configuration lives behind `Cell`/`RefCell` so
/// that a listener callback, which only ever sees `&WeightedEstimator`, can
/// still attempt a setter call — and observe it rejected with
/// [`PolyEstimatorError::Locked`] while `estimate()` is running.
pub struct WeightedEstimator {
    degree: Cell<usize>,
    observations: RefCell<Vec<Observation>>,
    weights: RefCell<Vec<f64>>,
    max_evaluations: Cell<Option<usize>>,
    sort_weights: Cell<bool>,
    listener: RefCell<Option<Box<dyn EstimatorListener<WeightedEstimator>>>>,
    locked: Cell<bool>,
}

impl WeightedEstimator {
    pub fn new(degree: usize) -> Result<Self, PolyEstimatorError> {
        validate_degree(degree)?;
        Ok(Self {
            degree: Cell::new(degree),
            observations: RefCell::new(Vec::new()),
            weights: RefCell::new(Vec::new()),
            max_evaluations: Cell::new(None),
            sort_weights: Cell::new(true),
            listener: RefCell::new(None),
            locked: Cell::new(false),
        })
    }

    pub fn get_type(&self) -> PolynomialEstimatorType {
        PolynomialEstimatorType::Weighted
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

    pub fn get_weights(&self) -> Vec<f64> {
        self.weights.borrow().clone()
    }

    /// Sets the observations together with their parallel non-negative weights.
    pub fn set_evaluations(
        &self,
        observations: Vec<Observation>,
        weights: Vec<f64>,
    ) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        if observations.len() != weights.len() {
            return Err(PolyEstimatorError::InvalidConfiguration(format!(
                "observations ({}) and weights ({}) must have the same length",
                observations.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "weights must be finite and non-negative".into(),
            ));
        }
        *self.observations.borrow_mut() = observations;
        *self.weights.borrow_mut() = weights;
        Ok(())
    }

    pub fn get_max_evaluations(&self) -> Option<usize> {
        self.max_evaluations.get()
    }

    pub fn set_max_evaluations(&self, max_evaluations: Option<usize>) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        if let Some(m) = max_evaluations {
            if m < self.min_number_of_evaluations() {
                return Err(PolyEstimatorError::InvalidConfiguration(format!(
                    "max_evaluations ({}) must be >= min_number_of_evaluations ({})",
                    m,
                    self.min_number_of_evaluations()
                )));
            }
        }
        self.max_evaluations.set(max_evaluations);
        Ok(())
    }

    pub fn is_sort_weights(&self) -> bool {
        self.sort_weights.get()
    }

    pub fn set_sort_weights(&self, sort_weights: bool) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        self.sort_weights.set(sort_weights);
        Ok(())
    }

    pub fn set_listener(
        &self,
        listener: Option<Box<dyn EstimatorListener<WeightedEstimator>>>,
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
            let weights = self.weights.borrow();
            solve_weighted(
                &observations,
                &weights,
                self.degree.get(),
                self.max_evaluations.get(),
                self.sort_weights.get(),
            )
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

fn solve_weighted(
    observations: &[Observation],
    weights: &[f64],
    degree: usize,
    max_evaluations: Option<usize>,
    sort_weights: bool,
) -> Result<Polynomial, PolyEstimatorError> {
    let min_evaluations = degree + 1;
    let k = max_evaluations
        .unwrap_or(observations.len())
        .min(observations.len());
    if k < min_evaluations {
        return Err(PolyEstimatorError::NotReady(format!(
            "need at least {} observations after capping at max_evaluations, have {}",
            min_evaluations, k
        )));
    }

    let mut indices: Vec<usize> = (0..observations.len()).collect();
    if sort_weights {
        indices.sort_by(|&a, &b| {
            weights[b]
                .partial_cmp(&weights[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    indices.truncate(k);

    let selected_observations: Vec<Observation> =
        indices.iter().map(|&i| observations[i].clone()).collect();
    let selected_weights: Vec<f64> = indices.iter().map(|&i| weights[i]).collect();

    let (mut a, mut b) = LinearSystemBuilder::build(&selected_observations, degree)?;

    let w_max = selected_weights
        .iter()
        .cloned()
        .fold(0.0_f64, f64::max);
    if w_max <= 0.0 {
        return Err(PolyEstimatorError::InvalidConfiguration(
            "at least one selected weight must be positive".into(),
        ));
    }
    for (i, &w) in selected_weights.iter().enumerate() {
        let scale = w / w_max;
        a.row_mut(i).iter_mut().for_each(|v| *v *= scale);
        b[i] *= scale;
    }

    let p = solve_least_squares(&a, &b)?;
    Polynomial::new(p.to_vec())
}
