use std::cell::{Cell, RefCell};

use crate::error::PolyEstimatorError;
use crate::estimator_type::PolynomialEstimatorType;
use crate::listener::EstimatorListener;
use crate::lock::LockGuard;
use crate::observation::Observation;
use crate::polynomial::Polynomial;

use super::common::{self, Sampling, Scoring};

/// PROSAC: progressive sampling from the highest-quality prefix of the
/// observation list, scored by inlier count within `threshold` (same scoring
/// as RANSAC).
///
/// Every setter takes `&self`: configuration lives behind `Cell`/`RefCell` so
/// that a listener callback, which only ever sees `&ProsacEstimator`, can
/// still attempt a setter call — and observe it rejected with
/// [`PolyEstimatorError::Locked`] while `estimate()` is running.
pub struct ProsacEstimator {
    degree: Cell<usize>,
    observations: RefCell<Vec<Observation>>,
    quality_scores: RefCell<Vec<f64>>,
    threshold: Cell<f64>,
    confidence: Cell<f64>,
    max_iterations: Cell<usize>,
    progress_delta: Cell<f64>,
    use_geometric_distance: Cell<bool>,
    refine_result: Cell<bool>,
    listener: RefCell<Option<Box<dyn EstimatorListener<ProsacEstimator>>>>,
    locked: Cell<bool>,
}

impl ProsacEstimator {
    pub fn new(degree: usize) -> Result<Self, PolyEstimatorError> {
        validate_degree(degree)?;
        Ok(Self {
            degree: Cell::new(degree),
            observations: RefCell::new(Vec::new()),
            quality_scores: RefCell::new(Vec::new()),
            threshold: Cell::new(1.0),
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
        PolynomialEstimatorType::Prosac
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
        let quality_scores = self.quality_scores.borrow();
        if !quality_scores.is_empty() && quality_scores.len() != observations.len() {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "quality_scores length must equal observations count".into(),
            ));
        }
        drop(quality_scores);
        *self.observations.borrow_mut() = observations;
        Ok(())
    }

    pub fn get_quality_scores(&self) -> Vec<f64> {
        self.quality_scores.borrow().clone()
    }

    pub fn set_quality_scores(&self, quality_scores: Vec<f64>) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        let observations = self.observations.borrow();
        if !observations.is_empty() && quality_scores.len() != observations.len() {
            return Err(PolyEstimatorError::InvalidConfiguration(format!(
                "quality_scores length ({}) must equal observations count ({})",
                quality_scores.len(),
                observations.len()
            )));
        }
        drop(observations);
        *self.quality_scores.borrow_mut() = quality_scores;
        Ok(())
    }

    pub fn get_threshold(&self) -> f64 {
        self.threshold.get()
    }

    pub fn set_threshold(&self, threshold: f64) -> Result<(), PolyEstimatorError> {
        self.reject_if_locked()?;
        if !(threshold > 0.0) {
            return Err(PolyEstimatorError::InvalidConfiguration(
                "threshold must be > 0".into(),
            ));
        }
        self.threshold.set(threshold);
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
        listener: Option<Box<dyn EstimatorListener<ProsacEstimator>>>,
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
            && self.quality_scores.borrow().len() == self.observations.borrow().len()
    }

    fn reject_if_locked(&self) -> Result<(), PolyEstimatorError> {
        if self.locked.get() {
            Err(PolyEstimatorError::Locked)
        } else {
            Ok(())
        }
    }

    fn quality_sorted_indices(&self) -> Vec<usize> {
        let quality_scores = self.quality_scores.borrow();
        let mut indices: Vec<usize> = (0..self.observations.borrow().len()).collect();
        indices.sort_by(|&a, &b| {
            quality_scores[b]
                .partial_cmp(&quality_scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        indices
    }

    pub fn estimate(&self) -> Result<(Polynomial, Vec<bool>), PolyEstimatorError> {
        if self.locked.get() {
            return Err(PolyEstimatorError::Locked);
        }
        if !self.is_ready() {
            return Err(PolyEstimatorError::NotReady(
                "need enough observations and a matching quality_scores array".into(),
            ));
        }

        let _guard = LockGuard::acquire(&self.locked);

        if let Some(l) = self.listener.borrow_mut().as_mut() {
            l.on_estimate_start(self);
        }

        let quality_sorted = self.quality_sorted_indices();
        let observations = self.observations.borrow();
        let outcome = common::run(
            &observations,
            self.degree.get(),
            Sampling::Progressive { quality_sorted },
            Scoring::InlierCount {
                threshold: self.threshold.get(),
            },
            self.confidence.get(),
            self.max_iterations.get(),
            self.progress_delta.get(),
            self.use_geometric_distance.get(),
            self.refine_result.get(),
            None,
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
