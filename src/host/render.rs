//! Render decisions.

use crate::driver::DeviceHandle;
use crate::permission::CameraStatus;
use crate::props::NativeProps;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the host decides whether to show the capture surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Show the surface only once authorized; placeholders otherwise.
    #[default]
    Gated,
    /// Always show the surface and hand the caller the current status.
    CallerControlled,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gated" => Ok(RenderMode::Gated),
            "caller-controlled" => Ok(RenderMode::CallerControlled),
            other => Err(format!("unknown render mode: {other}")),
        }
    }
}

/// View shown in place of the capture surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Placeholder {
    /// Small activity indicator.
    ActivityIndicator,
    /// Centered text.
    Message(String),
}

/// Placeholders for the pending and not-authorized states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub pending: Placeholder,
    pub not_authorized: Placeholder,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            pending: Placeholder::ActivityIndicator,
            not_authorized: Placeholder::Message("Camera not authorized".to_string()),
        }
    }
}

/// The capture surface and the props it is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSurface {
    /// Translated props.
    pub props: NativeProps,
    /// Status handed to a caller-controlled child; `None` when gated.
    pub status: Option<CameraStatus>,
    /// Device handed to a caller-controlled child, once one is attached.
    /// Always `None` when gated.
    pub device: Option<DeviceHandle>,
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput<'a> {
    Capture(CaptureSurface),
    Pending(&'a Placeholder),
    NotAuthorized(&'a Placeholder),
}

impl RenderOutput<'_> {
    /// Returns true if the capture surface is rendered.
    pub fn is_capture(&self) -> bool {
        matches!(self, RenderOutput::Capture(_))
    }

    /// Returns the surface props when the capture surface is rendered.
    pub fn props(&self) -> Option<&NativeProps> {
        match self {
            RenderOutput::Capture(surface) => Some(&surface.props),
            _ => None,
        }
    }
}
