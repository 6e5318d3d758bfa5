//! Native capture driver and permission provider.
//!
//! The capture pipeline itself lives outside this crate. This module
//! describes the narrow surface the control layer talks to: the driver's
//! capability descriptor, its imperative calls keyed by a device handle,
//! and the asynchronous permission provider.

mod capabilities;
mod device;
mod mock;

pub use capabilities::{BarcodeDetectionConstants, CodeTable, DriverCapabilities};
pub use device::{CaptureDriver, DeviceHandle, DriverError, PermissionProvider, Platform};
pub use mock::{
    DriverCall, ManualPermissionProvider, MockDriver, PermissionResolver,
    StaticPermissionProvider,
};
