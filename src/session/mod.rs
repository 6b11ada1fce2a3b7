//! Session accounting for connections held against the remote endpoint

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts outstanding logical sessions against the remote endpoint
///
/// Diagnostic and throttling visibility only; the counter carries no
/// resources itself. Every connection the pool holds is reflected here:
/// the acquire, release, and drain paths keep increments paired 1:1 with
/// decrements.
#[derive(Debug, Default)]
pub struct SessionCounter {
    active: AtomicUsize,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show one more session in use
    pub fn add_session(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    /// Show one session released
    pub fn remove_session(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of sessions currently accounted for
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_stay_paired() {
        let counter = SessionCounter::new();
        assert_eq!(counter.active(), 0);

        counter.add_session();
        counter.add_session();
        assert_eq!(counter.active(), 2);

        counter.remove_session();
        assert_eq!(counter.active(), 1);

        counter.remove_session();
        assert_eq!(counter.active(), 0);
    }
}
