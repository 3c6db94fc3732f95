use std::time::{Duration, Instant};

/// Quiet window after the last search keystroke before the search runs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds at most one pending value. Scheduling replaces whatever is pending
/// and restarts the quiet window; [`Debouncer::poll`] hands the value out
/// once the window has elapsed. Nothing runs on its own: the owner polls it
/// from its event loop.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Returns the pending value if its quiet window is over.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if ready { self.flush() } else { None }
    }

    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_quiet_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule("a", start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), Some("a"));
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn newer_value_supersedes_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule("b", start);
        debouncer.schedule("be", start + Duration::from_millis(200));
        debouncer.schedule("bel", start + Duration::from_millis(400));
        assert_eq!(debouncer.poll(start + Duration::from_millis(650)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(700)), Some("bel"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn flush_and_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.schedule(1, start);
        assert_eq!(debouncer.flush(), Some(1));
        debouncer.schedule(2, start);
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + SEARCH_DEBOUNCE), None);
    }
}
