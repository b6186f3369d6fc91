//! Quiet-period debouncing for re-render on edit
//!
//! Time is supplied by the caller as a monotonic offset (for example the time
//! since the session started), so the same debouncer drives a browser event
//! loop, a file watcher, and deterministic tests.

use std::time::Duration;
use tracing::trace;

/// Quiet interval before an edit is rendered
pub const RENDER_DEBOUNCE: Duration = Duration::from_millis(180);

#[derive(Debug, Clone)]
struct Pending<T> {
    due: Duration,
    value: T,
}

/// Holds at most one scheduled value; scheduling again replaces it
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancel anything pending and schedule `value` for `now + interval`.
    ///
    /// Returns true when a pending value was replaced.
    pub fn schedule(&mut self, value: T, now: Duration) -> bool {
        let replaced = self.pending.is_some();
        let due = now.saturating_add(self.interval);
        self.pending = Some(Pending { due, value });
        trace!(due_ms = due.as_millis() as u64, replaced, "Render scheduled");
        replaced
    }

    /// Drop the pending value, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value fires
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    /// Time left until the pending value fires; zero when overdue
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.deadline().map(|due| due.saturating_sub(now))
    }

    /// Take the pending value once its quiet interval has elapsed
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        let due = self.deadline()?;
        if due <= now {
            self.cancel()
        } else {
            None
        }
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(RENDER_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_fires_after_quiet_interval() {
        let mut debouncer = Debouncer::default();
        debouncer.schedule("a", ms(0));
        assert_eq!(debouncer.poll(ms(179)), None);
        assert_eq!(debouncer.poll(ms(180)), Some("a"));
        assert_eq!(debouncer.poll(ms(500)), None);
    }

    #[test]
    fn test_reschedule_replaces_pending() {
        let mut debouncer = Debouncer::default();
        assert!(!debouncer.schedule(1, ms(0)));
        assert!(debouncer.schedule(2, ms(100)));
        assert_eq!(debouncer.poll(ms(180)), None);
        assert_eq!(debouncer.deadline(), Some(ms(280)));
        assert_eq!(debouncer.poll(ms(280)), Some(2));
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::default();
        debouncer.schedule("x", ms(0));
        assert_eq!(debouncer.cancel(), Some("x"));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(ms(1_000)), None);
    }

    #[test]
    fn test_remaining_saturates() {
        let mut debouncer = Debouncer::new(ms(50));
        debouncer.schedule((), ms(10));
        assert_eq!(debouncer.remaining(ms(20)), Some(ms(40)));
        assert_eq!(debouncer.remaining(ms(200)), Some(Duration::ZERO));
    }
}
