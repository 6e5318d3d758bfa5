//! Prometheus metrics for the camera control layer.
//!
//! # Metrics Exposed
//!
//! ## Event Throttle
//! - `camera_gate_events_forwarded_total` - Detection events forwarded to the application
//! - `camera_gate_events_suppressed_total` - Duplicates dropped inside the throttle window
//!
//! ## Permission Gate
//! - `camera_gate_permission_granted_total` - Requests resolved as authorized
//! - `camera_gate_permission_denied_total` - Requests resolved as denied
//! - `camera_gate_late_resolutions_discarded_total` - Answers that arrived after teardown
//!
//! ## Device
//! - `camera_gate_device_attached` - Whether a capture surface is attached
//! - `camera_gate_mount_errors_total` - Capture surface mount failures
//!
//! # Example
//!
//! ```no_run
//! use camera_gate::events::Admission;
//! use camera_gate::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.record_admission(Admission::Forwarded);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
