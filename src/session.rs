//! Scripted camera sessions.
//!
//! A session file describes a component configuration, the simulated
//! driver and permission answer, and a timeline of detection events. The
//! runner replays it through a [`ComponentHost`] with mock collaborators.

use crate::driver::{
    DeviceHandle, DriverCapabilities, MockDriver, Platform, StaticPermissionProvider,
};
use crate::events::{DetectionEvent, ManualClock};
use crate::host::{ComponentHost, ControlError, HostCallbacks, Placeholder, RenderMode, RenderOutput};
use crate::metrics::{MetricsError, MetricsRegistry};
use crate::permission::{CameraStatus, GateError};
use crate::props::{CameraConfig, ConfigError, TranslateError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors while running a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Simulated driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSection {
    /// Platform of the simulated driver.
    pub platform: Platform,
    /// Use the stub descriptor, as when no native module is present.
    pub stub: bool,
    /// Native view tag assigned to the capture surface.
    pub view_tag: u64,
}

impl Default for DriverSection {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            stub: false,
            view_tag: 1,
        }
    }
}

/// Simulated permission answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSection {
    /// Whether the user grants access.
    pub granted: bool,
    /// How long the user takes to answer, in milliseconds.
    pub delay_ms: u64,
}

impl Default for PermissionSection {
    fn default() -> Self {
        Self {
            granted: true,
            delay_ms: 0,
        }
    }
}

/// Metrics output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

/// A detection event emitted `at_ms` after the surface becomes ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub at_ms: u64,
    pub payload: DetectionEvent,
}

/// Full session file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub mode: RenderMode,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub driver: DriverSection,
    #[serde(default)]
    pub permission: PermissionSection,
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl SessionFile {
    /// Loads a session from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses a session from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let session: SessionFile =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        session.camera.validate()?;
        Ok(session)
    }

    /// Built-in session: a QR code held in front of the camera.
    pub fn demo() -> Self {
        let qr = |data: &str| {
            DetectionEvent::new("barcode", object(json!({
                "target": 1,
                "barcodes": [{"data": data, "type": "QR_CODE"}],
            })))
        };
        Self {
            events: [(0, "hello"), (16, "hello"), (33, "hello"), (150, "hello"), (160, "world")]
                .into_iter()
                .map(|(at_ms, data)| ScriptedEvent {
                    at_ms,
                    payload: qr(data),
                })
                .collect(),
            ..Default::default()
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// What a render pass produced, in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum RenderSummary {
    Capture {
        props: Map<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<CameraStatus>,
        #[serde(skip_serializing_if = "Option::is_none")]
        device: Option<u64>,
    },
    Pending {
        placeholder: Placeholder,
    },
    NotAuthorized {
        placeholder: Placeholder,
    },
}

impl From<RenderOutput<'_>> for RenderSummary {
    fn from(output: RenderOutput<'_>) -> Self {
        match output {
            RenderOutput::Capture(surface) => RenderSummary::Capture {
                props: surface.props.into_inner(),
                status: surface.status,
                device: surface.device.map(|handle| handle.tag()),
            },
            RenderOutput::Pending(placeholder) => RenderSummary::Pending {
                placeholder: placeholder.clone(),
            },
            RenderOutput::NotAuthorized(placeholder) => RenderSummary::NotAuthorized {
                placeholder: placeholder.clone(),
            },
        }
    }
}

/// Outcome of a session run.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub before_authorization: RenderSummary,
    pub after_authorization: RenderSummary,
    pub status: CameraStatus,
    pub ready_notifications: u32,
    pub events_forwarded: u64,
    pub events_suppressed: u64,
    /// `None` when the platform has no ratio enumeration.
    pub supported_ratios: Option<Vec<String>>,
}

/// Replays a session through a component host.
pub async fn run_session(
    session: &SessionFile,
    metrics: MetricsRegistry,
) -> Result<SessionReport, SessionError> {
    let platform = session.driver.platform;
    let capabilities = if session.driver.stub {
        DriverCapabilities::stub()
    } else {
        DriverCapabilities::for_platform(platform)
    };
    let driver = Arc::new(MockDriver::with_capabilities(platform, capabilities));
    let provider = Arc::new(StaticPermissionProvider::with_delay(
        session.permission.granted,
        Duration::from_millis(session.permission.delay_ms),
    ));

    let ready = Rc::new(Cell::new(0u32));
    let ready_count = Rc::clone(&ready);
    let callbacks = HostCallbacks::new()
        .on_ready(move || ready_count.set(ready_count.get() + 1))
        .on_detection(|event| {
            let barcodes = event.barcodes().unwrap_or_default();
            tracing::info!(event_type = event.event_type(), barcodes = barcodes.len(), "Detected");
        });

    let clock = ManualClock::new();
    let mut host = ComponentHost::builder(driver, provider)
        .config(session.camera.clone())
        .mode(session.mode)
        .callbacks(callbacks)
        .metrics(metrics.clone())
        .build_with_clock(clock.clone())?;

    let before_authorization = RenderSummary::from(host.render()?);
    let state = host.mount()?.await;
    tracing::info!(?state, "Permission request settled");

    let after = host.render()?;
    let surface_rendered = after.is_capture();
    let after_authorization = RenderSummary::from(after);

    let mut supported_ratios = None;
    if surface_rendered {
        host.attach(DeviceHandle::new(session.driver.view_tag));
        host.handle_ready();

        let mut elapsed = 0;
        let mut events = session.events.clone();
        events.sort_by_key(|event| event.at_ms);
        for scripted in &events {
            clock.advance(Duration::from_millis(scripted.at_ms.saturating_sub(elapsed)));
            elapsed = elapsed.max(scripted.at_ms);
            host.handle_detection(&scripted.payload);
        }

        host.pause_preview()?;
        host.resume_preview()?;

        supported_ratios = match host.supported_ratios().await {
            Ok(ratios) => Some(ratios),
            Err(ControlError::Unsupported { platform, .. }) => {
                tracing::info!(%platform, "Ratio enumeration unavailable");
                None
            }
            Err(e) => return Err(e.into()),
        };
    }

    host.unmount();

    Ok(SessionReport {
        before_authorization,
        after_authorization,
        status: host.status(),
        ready_notifications: ready.get(),
        events_forwarded: metrics.events_forwarded(),
        events_suppressed: metrics.events_suppressed(),
        supported_ratios,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_file() {
        let session = SessionFile::from_toml(
            r#"
            mode = "caller-controlled"

            [camera]
            type = "front"
            flashMode = "torch"
            zoom = 0.25

            [driver]
            platform = "ios"

            [permission]
            granted = false

            [[events]]
            at_ms = 5
            payload = { type = "qr", data = "X" }
            "#,
        )
        .unwrap();

        assert_eq!(session.mode, RenderMode::CallerControlled);
        assert_eq!(session.driver.platform, Platform::Ios);
        assert!(!session.permission.granted);
        assert_eq!(session.camera.zoom, 0.25);
        assert_eq!(session.events[0].payload.event_type(), "qr");
    }

    #[test]
    fn test_bundled_session_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/sessions/qr-scan.toml");
        let session = SessionFile::from_file(path).unwrap();
        assert_eq!(session.driver.view_tag, 12);
        assert_eq!(session.events.len(), 4);
        assert_eq!(session.camera.extra.get("testID"), Some(&json!("scanner")));
        assert_eq!(session.events[0].payload.barcodes().unwrap()[0].data, "ticket-42");
    }

    #[test]
    fn test_invalid_camera_section_rejected() {
        let result = SessionFile::from_toml("[camera]\nfocusDepth = 3.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidFocusDepth(_))));
    }

    #[test]
    fn test_event_without_type_rejected() {
        let result = SessionFile::from_toml("[[events]]\nat_ms = 0\npayload = { data = \"X\" }\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_demo_session_on_android() {
        let mut session = SessionFile::demo();
        session.driver.platform = Platform::Android;

        let report = run_session(&session, MetricsRegistry::new().unwrap())
            .await
            .unwrap();

        assert!(matches!(report.before_authorization, RenderSummary::Pending { .. }));
        match &report.after_authorization {
            RenderSummary::Capture { props, status, .. } => {
                assert_eq!(props.get("type"), Some(&json!(0)));
                assert_eq!(props.get("googleVisionBarcodeDetectorEnabled"), Some(&json!(true)));
                assert!(status.is_none());
            }
            other => panic!("expected capture surface, got {other:?}"),
        }
        assert_eq!(report.status, CameraStatus::Ready);
        assert_eq!(report.ready_notifications, 1);
        // 16ms and 33ms repeats fall inside the window.
        assert_eq!(report.events_forwarded, 3);
        assert_eq!(report.events_suppressed, 2);
        assert_eq!(report.supported_ratios.map(|r| r.len()), Some(3));
    }

    #[tokio::test]
    async fn test_denied_session_on_ios() {
        let mut session = SessionFile::demo();
        session.driver.platform = Platform::Ios;
        session.permission.granted = false;

        let report = run_session(&session, MetricsRegistry::new().unwrap())
            .await
            .unwrap();

        assert!(matches!(
            report.after_authorization,
            RenderSummary::NotAuthorized { .. }
        ));
        assert_eq!(report.status, CameraStatus::NotAuthorized);
        assert_eq!(report.events_forwarded, 0);
        assert!(report.supported_ratios.is_none());
    }

    #[tokio::test]
    async fn test_caller_controlled_session_on_ios() {
        let mut session = SessionFile::demo();
        session.mode = RenderMode::CallerControlled;
        session.driver.platform = Platform::Ios;

        let report = run_session(&session, MetricsRegistry::new().unwrap())
            .await
            .unwrap();

        match &report.before_authorization {
            RenderSummary::Capture { props, status, .. } => {
                assert_eq!(*status, Some(CameraStatus::Pending));
                assert!(props.get("ratio").is_none());
            }
            other => panic!("expected capture surface, got {other:?}"),
        }
        assert!(report.supported_ratios.is_none());
    }
}
