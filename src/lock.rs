use std::cell::Cell;

/// RAII guard for the `Idle -> Locked -> Idle` state machine every estimator
/// goes through during `estimate()`. Acquiring sets the flag; the flag is
/// guaranteed to flip back on every exit path (success, error, or an early
/// `?` return) because the guard's `Drop` impl runs regardless.
///
/// The flag lives in a [`Cell`] rather than behind `&mut` so that listener
/// callbacks can still take a shared `&estimator` reference while `estimate()`
/// holds the guard.
pub(crate) struct LockGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> LockGuard<'a> {
    pub fn acquire(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        LockGuard { flag }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
