/// Synchronous callback hooks fired around `estimate()`. All methods default
/// to no-ops so a listener only needs to implement the ones it cares about.
/// Callbacks are handed a shared reference to the estimator. Every
/// configuration setter takes `&self` (interior mutability under the hood),
/// so a callback can call one directly; doing so observes the estimator
/// locked and returns `Err(`[`crate::error::PolyEstimatorError::Locked`]`)`
/// rather than mutating it.
pub trait EstimatorListener<T> {
    /// Fired once, just after `estimate()` locks the estimator.
    fn on_estimate_start(&mut self, _estimator: &T) {}

    /// Fired once, just before `estimate()` unlocks the estimator (on every
    /// exit path: success or failure).
    fn on_estimate_end(&mut self, _estimator: &T) {}

    /// Fired by robust drivers at the end of every sampling iteration.
    fn on_iteration(&mut self, _estimator: &T, _iteration: usize) {}

    /// Fired by robust drivers whenever the estimated inlier-progress
    /// fraction crosses a multiple of `progress_delta`. Monotone
    /// non-decreasing across a single `estimate()` run.
    fn on_progress(&mut self, _estimator: &T, _progress: f64) {}
}

impl<T> EstimatorListener<T> for () {}
