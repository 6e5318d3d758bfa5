//! The camera component host.

use super::{CaptureSurface, Placeholders, RenderMode, RenderOutput};
use crate::driver::{CaptureDriver, DeviceHandle, DriverError, PermissionProvider, Platform};
use crate::events::{Admission, Clock, DetectionEvent, EventError, EventThrottle, SystemClock};
use crate::metrics::MetricsRegistry;
use crate::permission::{
    AuthorizationState, CameraStatus, GateError, PermissionGate, PermissionRequest,
};
use crate::props::{CameraConfig, ConfigError, PropTranslator, TranslateError};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Errors from imperative control calls.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("{operation} called with no capture device attached")]
    NotAttached { operation: &'static str },
    #[error("{operation} is not supported on {platform}")]
    Unsupported {
        platform: Platform,
        operation: &'static str,
    },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Failure reported by the capture surface while mounting.
///
/// The native payload is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct MountError {
    payload: Value,
}

impl MountError {
    /// Wraps a native mount-error payload.
    pub fn from_payload(payload: Value) -> Self {
        Self { payload }
    }

    /// Builds a mount error carrying only a message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self::from_payload(serde_json::json!({ "message": message.into() }))
    }

    /// Human-readable message, if the payload has one.
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(Value::as_str)
    }

    /// Native payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "camera failed to mount: {message}"),
            None => write!(f, "camera failed to mount: {}", self.payload),
        }
    }
}

type MountErrorCallback = Box<dyn FnMut(&MountError)>;
type ReadyCallback = Box<dyn FnMut()>;
type DetectionCallback = Box<dyn FnMut(&DetectionEvent)>;

/// Application callbacks.
#[derive(Default)]
pub struct HostCallbacks {
    on_mount_error: Option<MountErrorCallback>,
    on_ready: Option<ReadyCallback>,
    on_detection: Option<DetectionCallback>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the capture surface fails to mount.
    pub fn on_mount_error(mut self, callback: impl FnMut(&MountError) + 'static) -> Self {
        self.on_mount_error = Some(Box::new(callback));
        self
    }

    /// Called once the capture surface is ready.
    pub fn on_ready(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_ready = Some(Box::new(callback));
        self
    }

    /// Called for every detection event that survives the throttle.
    /// Registering it also enables detector mode on the surface.
    pub fn on_detection(mut self, callback: impl FnMut(&DetectionEvent) + 'static) -> Self {
        self.on_detection = Some(Box::new(callback));
        self
    }

    /// Returns true if a detection callback is registered.
    pub fn has_detection_listener(&self) -> bool {
        self.on_detection.is_some()
    }
}

impl fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCallbacks")
            .field("on_mount_error", &self.on_mount_error.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .field("on_detection", &self.on_detection.is_some())
            .finish()
    }
}

/// Builder for [`ComponentHost`].
pub struct HostBuilder {
    driver: Arc<dyn CaptureDriver>,
    provider: Arc<dyn PermissionProvider>,
    config: CameraConfig,
    mode: RenderMode,
    placeholders: Placeholders,
    callbacks: HostCallbacks,
    metrics: Option<MetricsRegistry>,
}

impl HostBuilder {
    /// Sets the camera configuration.
    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the render mode.
    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the pending and not-authorized placeholders.
    pub fn placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Sets the application callbacks.
    pub fn callbacks(mut self, callbacks: HostCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Reports host activity to a metrics registry.
    pub fn metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds a host on the system clock.
    pub fn build(self) -> Result<ComponentHost, ConfigError> {
        self.build_with_clock(SystemClock)
    }

    /// Builds a host whose throttle reads time from `clock`.
    pub fn build_with_clock<C: Clock>(self, clock: C) -> Result<ComponentHost<C>, ConfigError> {
        self.config.validate()?;
        let translator =
            PropTranslator::from_capabilities(self.driver.capabilities(), self.driver.platform());
        if self.driver.capabilities().is_stubbed() {
            tracing::warn!("Native camera module unavailable, using stub capabilities");
        }

        Ok(ComponentHost {
            driver: self.driver,
            provider: self.provider,
            config: self.config,
            mode: self.mode,
            placeholders: self.placeholders,
            callbacks: self.callbacks,
            metrics: self.metrics,
            translator,
            gate: PermissionGate::new(),
            throttle: EventThrottle::with_clock(clock),
            device: None,
        })
    }
}

/// One mounted camera component.
///
/// The host owns its permission gate, its throttle records and the handle
/// of the attached capture surface; nothing is shared between hosts.
pub struct ComponentHost<C: Clock = SystemClock> {
    driver: Arc<dyn CaptureDriver>,
    provider: Arc<dyn PermissionProvider>,
    config: CameraConfig,
    mode: RenderMode,
    placeholders: Placeholders,
    callbacks: HostCallbacks,
    metrics: Option<MetricsRegistry>,
    translator: PropTranslator,
    gate: PermissionGate,
    throttle: EventThrottle<C>,
    device: Option<DeviceHandle>,
}

impl ComponentHost {
    /// Starts building a host over the given driver and permission provider.
    pub fn builder(
        driver: Arc<dyn CaptureDriver>,
        provider: Arc<dyn PermissionProvider>,
    ) -> HostBuilder {
        HostBuilder {
            driver,
            provider,
            config: CameraConfig::default(),
            mode: RenderMode::default(),
            placeholders: Placeholders::default(),
            callbacks: HostCallbacks::default(),
            metrics: None,
        }
    }
}

impl<C: Clock> ComponentHost<C> {
    /// Mounts the component, issuing its permission request.
    ///
    /// The returned future must be driven for the request to complete; the
    /// host keeps rendering the pending placeholder meanwhile. Video only:
    /// no microphone access is requested.
    pub fn mount(
        &self,
    ) -> Result<impl Future<Output = AuthorizationState> + Send + 'static, GateError> {
        let request = PermissionRequest {
            requires_audio: false,
            dialog_title: self.config.permission_dialog_title.clone(),
            dialog_message: self.config.permission_dialog_message.clone(),
        };
        let pending = self.gate.initialize(
            Arc::clone(&self.provider),
            self.driver.capabilities().clone(),
            request,
        )?;
        let metrics = self.metrics.clone();

        Ok(async move {
            let state = pending.await;
            if let Some(metrics) = metrics {
                metrics.record_authorization(state);
            }
            state
        })
    }

    /// Tears the component down. A permission answer arriving later is
    /// discarded and the device handle is released.
    pub fn unmount(&mut self) {
        self.gate.teardown();
        self.detach();
        tracing::debug!("Camera component unmounted");
    }

    /// Evaluates what the component renders right now.
    pub fn render(&self) -> Result<RenderOutput<'_>, TranslateError> {
        let status = self.gate.status();

        if status == CameraStatus::Ready || self.mode == RenderMode::CallerControlled {
            let props = self
                .translator
                .translate_config(&self.config, self.callbacks.has_detection_listener())?;
            let (status, device) = match self.mode {
                RenderMode::CallerControlled => (Some(status), self.device),
                RenderMode::Gated => (None, None),
            };
            Ok(RenderOutput::Capture(CaptureSurface {
                props,
                status,
                device,
            }))
        } else if !self.gate.is_checked() {
            Ok(RenderOutput::Pending(&self.placeholders.pending))
        } else {
            Ok(RenderOutput::NotAuthorized(&self.placeholders.not_authorized))
        }
    }

    /// Replaces the configuration used by subsequent render passes.
    pub fn set_config(&mut self, config: CameraConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Current configuration.
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Current status.
    pub fn status(&self) -> CameraStatus {
        self.gate.status()
    }

    /// Current authorization state.
    pub fn authorization(&self) -> AuthorizationState {
        self.gate.state()
    }

    /// Render mode chosen at construction.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Called when the capture surface attaches.
    pub fn attach(&mut self, handle: DeviceHandle) {
        if let Some(previous) = self.device.replace(handle) {
            tracing::debug!(%previous, %handle, "Capture surface replaced");
        } else {
            tracing::debug!(%handle, "Capture surface attached");
        }
        if let Some(metrics) = &self.metrics {
            metrics.set_device_attached(true);
        }
    }

    /// Called when the capture surface detaches.
    pub fn detach(&mut self) {
        if let Some(handle) = self.device.take() {
            tracing::debug!(%handle, "Capture surface detached");
            if let Some(metrics) = &self.metrics {
                metrics.set_device_attached(false);
            }
        }
    }

    /// Handle of the attached capture surface.
    pub fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    /// Forwards a surface mount failure to the application.
    pub fn handle_mount_error(&mut self, error: MountError) {
        tracing::warn!(%error, "Capture surface failed to mount");
        if let Some(metrics) = &self.metrics {
            metrics.record_mount_error();
        }
        if let Some(callback) = self.callbacks.on_mount_error.as_mut() {
            callback(&error);
        }
    }

    /// Forwards the surface's ready notification to the application.
    pub fn handle_ready(&mut self) {
        tracing::debug!("Capture surface ready");
        if let Some(callback) = self.callbacks.on_ready.as_mut() {
            callback();
        }
    }

    /// Routes a detection event through the throttle to the application.
    pub fn handle_detection(&mut self, event: &DetectionEvent) -> Admission {
        let listener = self
            .callbacks
            .on_detection
            .as_mut()
            .map(|callback| move |event: &DetectionEvent| callback(event));
        let admission = self.throttle.observe(event, listener);
        if let Some(metrics) = &self.metrics {
            metrics.record_admission(admission);
        }
        admission
    }

    /// Decodes a raw detector payload and routes it like [`handle_detection`](Self::handle_detection).
    pub fn handle_detection_payload(&mut self, payload: Value) -> Result<Admission, EventError> {
        let event = DetectionEvent::from_payload(payload)?;
        Ok(self.handle_detection(&event))
    }

    /// Throttle state, for inspection.
    pub fn throttle(&self) -> &EventThrottle<C> {
        &self.throttle
    }

    fn attached(&self, operation: &'static str) -> Result<DeviceHandle, ControlError> {
        debug_assert!(
            self.device.is_some(),
            "{operation} called with no capture device attached"
        );
        self.device.ok_or(ControlError::NotAttached { operation })
    }

    /// Pauses the preview of the attached surface.
    pub fn pause_preview(&self) -> Result<(), ControlError> {
        let handle = self.attached("pause_preview")?;
        self.driver.pause_preview(handle)?;
        Ok(())
    }

    /// Resumes the preview of the attached surface.
    pub fn resume_preview(&self) -> Result<(), ControlError> {
        let handle = self.attached("resume_preview")?;
        self.driver.resume_preview(handle)?;
        Ok(())
    }

    /// Lists the aspect ratios the attached surface supports.
    ///
    /// Fails with [`ControlError::Unsupported`] on platforms without ratio
    /// selection, whether or not a surface is attached.
    pub fn supported_ratios(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, ControlError>> + Send + 'static {
        let platform = self.translator.platform();
        let driver = Arc::clone(&self.driver);
        let target = if platform.supports_ratio() {
            self.attached("supported_ratios")
        } else {
            Err(ControlError::Unsupported {
                platform,
                operation: "ratio enumeration",
            })
        };

        async move {
            let handle = target?;
            Ok(driver.supported_ratios(handle).await?)
        }
    }
}

impl<C: Clock> fmt::Debug for ComponentHost<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHost")
            .field("mode", &self.mode)
            .field("status", &self.status())
            .field("device", &self.device)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
