//! Camera component host.
//!
//! Composes the permission gate, prop translator and event throttle into
//! one component: it decides what to render, forwards translated props and
//! filtered events, and exposes imperative control of the attached device.

mod component;
mod render;

pub use component::{ComponentHost, ControlError, HostBuilder, HostCallbacks, MountError};
pub use render::{CaptureSurface, Placeholder, Placeholders, RenderMode, RenderOutput};
