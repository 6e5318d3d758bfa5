//! Camera Gate
//!
//! Control layer between an application's declarative camera configuration
//! and a native capture driver. It gates the capture surface on a runtime
//! permission request, throttles duplicate detection events, and translates
//! symbolic configuration into the driver's numeric vocabulary.
//!
//! # Architecture
//!
//! ```text
//! configuration ──→ props ──→ capture surface
//! surface events ──→ events (throttle) ──→ application callback
//! mount ──→ permission (gate) ──→ host render decision
//! ```
//!
//! The native pipeline, the permission dialog and the view tree are
//! external; they are reached through the traits in [`driver`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use camera_gate::{
//!     driver::{DeviceHandle, MockDriver, Platform, StaticPermissionProvider},
//!     host::{ComponentHost, HostCallbacks},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = Arc::new(MockDriver::new(Platform::Android));
//! let provider = Arc::new(StaticPermissionProvider::new(true));
//!
//! let mut host = ComponentHost::builder(driver, provider)
//!     .callbacks(HostCallbacks::new().on_detection(|event| {
//!         println!("detected {}", event.event_type());
//!     }))
//!     .build()?;
//!
//! // Pending placeholder until the request settles
//! assert!(!host.render()?.is_capture());
//! host.mount()?.await;
//! assert!(host.render()?.is_capture());
//!
//! host.attach(DeviceHandle::new(1));
//! host.pause_preview()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod driver;
pub mod events;
pub mod host;
pub mod metrics;
pub mod permission;
pub mod props;
pub mod session;

// Re-export commonly used types at crate root
pub use driver::{CaptureDriver, DeviceHandle, DriverCapabilities, PermissionProvider, Platform};
pub use events::{Admission, DetectionEvent, EventThrottle, THROTTLE_WINDOW};
pub use host::{ComponentHost, HostCallbacks, RenderMode, RenderOutput};
pub use permission::{AuthorizationState, CameraStatus, PermissionGate};
pub use props::{CameraConfig, NativeProps, PropTranslator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
