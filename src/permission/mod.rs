//! Runtime camera permission gating.
//!
//! A gate issues one permission request per mount and records the answer
//! only while its mount is still live. Late answers arriving after teardown
//! are discarded.

mod gate;
mod liveness;

pub use gate::{AuthorizationState, CameraStatus, GateError, PermissionGate, PermissionRequest};
pub use liveness::LivenessToken;
