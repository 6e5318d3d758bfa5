//! Per-type duplicate suppression.

use super::{Clock, DetectionEvent, Fingerprint, SystemClock};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Window within which an identical event of the same type is dropped.
pub const THROTTLE_WINDOW: Duration = Duration::from_millis(100);

/// Last forwarded event of one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    fingerprint: Fingerprint,
    emitted_at: Instant,
}

impl EventRecord {
    /// Fingerprint of the last forwarded payload.
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// When the last payload was forwarded.
    #[inline]
    pub fn emitted_at(&self) -> Instant {
        self.emitted_at
    }
}

/// Outcome of observing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The callback was invoked.
    Forwarded,
    /// Duplicate of the last forwarded event inside the window.
    Suppressed,
    /// No callback is listening; nothing was recorded.
    NoListener,
}

/// Suppresses duplicate detection events per event type.
///
/// An event is dropped only when its type was forwarded before, with a
/// structurally equal payload, less than one window ago. Records live as
/// long as the throttle and are never evicted.
#[derive(Debug)]
pub struct EventThrottle<C: Clock = SystemClock> {
    records: HashMap<String, EventRecord>,
    window: Duration,
    clock: C,
}

impl EventThrottle<SystemClock> {
    /// Creates a throttle on the system clock with the default window.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for EventThrottle<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> EventThrottle<C> {
    /// Creates a throttle on the given clock with the default window.
    pub fn with_clock(clock: C) -> Self {
        Self::with_window(clock, THROTTLE_WINDOW)
    }

    /// Creates a throttle with a custom window.
    pub fn with_window(clock: C, window: Duration) -> Self {
        Self {
            records: HashMap::new(),
            window,
            clock,
        }
    }

    /// Observes an event, forwarding it to `callback` unless it is a duplicate.
    ///
    /// With no callback this is a no-op and no record is created.
    pub fn observe<F>(&mut self, event: &DetectionEvent, callback: Option<F>) -> Admission
    where
        F: FnOnce(&DetectionEvent),
    {
        let Some(callback) = callback else {
            return Admission::NoListener;
        };

        let fingerprint = event.fingerprint();
        let now = self.clock.now();

        if let Some(record) = self.records.get(event.event_type()) {
            if record.fingerprint == fingerprint
                && now.saturating_duration_since(record.emitted_at) < self.window
            {
                tracing::trace!(event_type = event.event_type(), "Suppressed duplicate event");
                return Admission::Suppressed;
            }
        }

        callback(event);
        self.records.insert(
            event.event_type().to_string(),
            EventRecord {
                fingerprint,
                emitted_at: now,
            },
        );
        Admission::Forwarded
    }

    /// Returns the record of an event type, if one was ever forwarded.
    pub fn record(&self, event_type: &str) -> Option<&EventRecord> {
        self.records.get(event_type)
    }

    /// Number of event types seen so far.
    pub fn tracked_types(&self) -> usize {
        self.records.len()
    }

    /// Suppression window.
    pub fn window(&self) -> Duration {
        self.window
    }
}
