//! Detection events and duplicate suppression.
//!
//! Detector drivers re-emit the same result many times per second. The
//! throttle collapses structurally identical events of the same type that
//! arrive within a short window, while letting new content through at once.

mod clock;
mod event;
mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use event::{Barcode, BarcodeBounds, DetectionEvent, EventError, Fingerprint, Point, Size};
pub use throttle::{Admission, EventRecord, EventThrottle, THROTTLE_WINDOW};
