//! Driver and permission provider abstractions.
//!
//! These traits are the seams between the control layer and the native
//! side, allowing a real driver or a mock to be plugged in.

use super::DriverCapabilities;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Host platform the driver runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Supports variable aspect ratio selection and enumeration.
    Android,
    /// Fixed aspect ratio; no ratio enumeration.
    Ios,
}

impl Platform {
    /// Platform this binary was compiled for. Anything other than iOS
    /// drives the Android-style backend.
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Android
        }
    }

    /// Returns true if the platform accepts an aspect-ratio selection.
    #[inline]
    pub fn supports_ratio(self) -> bool {
        matches!(self, Platform::Android)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => f.write_str("android"),
            Platform::Ios => f.write_str("ios"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Opaque reference to an attached native capture surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    /// Wraps the native view tag of a capture surface.
    pub fn new(tag: u64) -> Self {
        Self(tag)
    }

    /// Returns the native view tag.
    #[inline]
    pub fn tag(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors reported by the capture driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{operation} is not supported on {platform}")]
    Unsupported {
        platform: Platform,
        operation: &'static str,
    },
    #[error("driver call failed: {0}")]
    CallFailed(String),
}

/// Imperative interface of the native capture driver.
#[async_trait]
pub trait CaptureDriver: Send + Sync {
    /// Capability constants published by the driver.
    fn capabilities(&self) -> &DriverCapabilities;

    /// Platform the driver runs on.
    fn platform(&self) -> Platform;

    /// Pauses the preview of the given surface.
    fn pause_preview(&self, handle: DeviceHandle) -> Result<(), DriverError>;

    /// Resumes the preview of the given surface.
    fn resume_preview(&self, handle: DeviceHandle) -> Result<(), DriverError>;

    /// Enumerates the aspect ratios the surface's sensor supports.
    ///
    /// Only meaningful where [`Platform::supports_ratio`] holds.
    async fn supported_ratios(&self, handle: DeviceHandle) -> Result<Vec<String>, DriverError>;
}

/// Runtime permission provider.
///
/// Always resolves to a boolean. A provider that never resolves leaves the
/// requesting gate pending forever.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Requests camera (and optionally microphone) access.
    async fn request_permissions(
        &self,
        requires_audio: bool,
        capabilities: &DriverCapabilities,
        dialog_title: &str,
        dialog_message: &str,
    ) -> bool;
}
