//! Debounce filter for raw key events.
//!
//! Physical buttons bounce, and cheap keyboards emit bursts of duplicate
//! key-down events. The [`Debouncer`] keeps at most one trigger per window:
//! events inside the window are dropped, not delayed or queued. Timing uses
//! the monotonic clock, so wall-clock adjustments cannot re-open or extend
//! a window.

use std::time::{Duration, Instant};

/// Default suppression window between accepted triggers.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// One raw key-down event from an input device.
///
/// Ephemeral: produced per key-down, consumed by the debounce filter,
/// never persisted.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    /// Which device produced the event (for logging only).
    pub device: String,
    /// Monotonic timestamp of the key-down.
    pub at: Instant,
}

/// Sliding-window duplicate suppression.
///
/// The window is anchored to the last *accepted* event: suppressed events
/// do not extend it, so a burst of presses fires exactly once per window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_fire: Option<Instant>,
}

impl Debouncer {
    /// Creates a debouncer with the given suppression window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fire: None,
        }
    }

    /// Observes an event at `at`; returns true if it should fire.
    ///
    /// Fires when no prior event has fired, or when at least the window has
    /// elapsed since the last fire. A fired event becomes the new anchor.
    pub fn observe(&mut self, at: Instant) -> bool {
        match self.last_fire {
            Some(last) if at.duration_since(last) < self.window => false,
            _ => {
                self.last_fire = Some(at);
                true
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_always_fires() {
        let mut debouncer = Debouncer::default();
        assert!(debouncer.observe(Instant::now()));
    }

    #[test]
    fn event_inside_window_is_dropped() {
        let mut debouncer = Debouncer::default();
        let base = Instant::now();
        assert!(debouncer.observe(base));
        assert!(!debouncer.observe(base + Duration::from_millis(999)));
    }

    #[test]
    fn event_at_window_boundary_fires() {
        let mut debouncer = Debouncer::default();
        let base = Instant::now();
        assert!(debouncer.observe(base));
        assert!(debouncer.observe(base + Duration::from_secs(1)));
    }

    #[test]
    fn suppressed_events_do_not_extend_the_window() {
        let mut debouncer = Debouncer::default();
        let base = Instant::now();
        assert!(debouncer.observe(base));
        // Bounce at 500ms is dropped and must not move the anchor.
        assert!(!debouncer.observe(base + Duration::from_millis(500)));
        assert!(debouncer.observe(base + Duration::from_secs(1)));
    }

    #[test]
    fn fired_event_becomes_the_new_anchor() {
        let mut debouncer = Debouncer::default();
        let base = Instant::now();
        assert!(debouncer.observe(base));
        assert!(debouncer.observe(base + Duration::from_secs(1)));
        // 1.5s is only 0.5s after the second fire.
        assert!(!debouncer.observe(base + Duration::from_millis(1500)));
    }

    #[test]
    fn custom_window_is_respected() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let base = Instant::now();
        assert!(debouncer.observe(base));
        assert!(!debouncer.observe(base + Duration::from_millis(50)));
        assert!(debouncer.observe(base + Duration::from_millis(100)));
    }
}
