//! Metrics collection and registry.

use crate::events::Admission;
use crate::permission::AuthorizationState;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus registry for the camera control layer.
///
/// Cloning is cheap; clones update the same underlying metrics.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,

    // Event throttle
    events_forwarded: IntCounter,
    events_suppressed: IntCounter,

    // Permission gate
    permission_granted: IntCounter,
    permission_denied: IntCounter,
    late_resolutions_discarded: IntCounter,

    // Device
    device_attached: IntGauge,
    mount_errors: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new registry with all control-layer metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let events_forwarded = IntCounter::new(
            "camera_gate_events_forwarded_total",
            "Detection events forwarded to the application",
        )?;
        let events_suppressed = IntCounter::new(
            "camera_gate_events_suppressed_total",
            "Duplicate detection events suppressed by the throttle",
        )?;
        let permission_granted = IntCounter::new(
            "camera_gate_permission_granted_total",
            "Permission requests resolved as authorized",
        )?;
        let permission_denied = IntCounter::new(
            "camera_gate_permission_denied_total",
            "Permission requests resolved as denied",
        )?;
        let late_resolutions_discarded = IntCounter::new(
            "camera_gate_late_resolutions_discarded_total",
            "Permission answers discarded because the component was torn down",
        )?;
        let device_attached = IntGauge::new(
            "camera_gate_device_attached",
            "Whether a capture surface is attached (1=attached, 0=detached)",
        )?;
        let mount_errors = IntCounter::new(
            "camera_gate_mount_errors_total",
            "Capture surface mount failures",
        )?;

        registry.register(Box::new(events_forwarded.clone()))?;
        registry.register(Box::new(events_suppressed.clone()))?;
        registry.register(Box::new(permission_granted.clone()))?;
        registry.register(Box::new(permission_denied.clone()))?;
        registry.register(Box::new(late_resolutions_discarded.clone()))?;
        registry.register(Box::new(device_attached.clone()))?;
        registry.register(Box::new(mount_errors.clone()))?;

        Ok(Self {
            registry,
            events_forwarded,
            events_suppressed,
            permission_granted,
            permission_denied,
            late_resolutions_discarded,
            device_attached,
            mount_errors,
        })
    }

    /// Records the outcome of one observed detection event.
    pub fn record_admission(&self, admission: Admission) {
        match admission {
            Admission::Forwarded => self.events_forwarded.inc(),
            Admission::Suppressed => self.events_suppressed.inc(),
            Admission::NoListener => {}
        }
    }

    /// Records the state a permission request settled in.
    ///
    /// A request that settles as `Unchecked` had its answer discarded.
    pub fn record_authorization(&self, state: AuthorizationState) {
        match state {
            AuthorizationState::Authorized => self.permission_granted.inc(),
            AuthorizationState::Denied => self.permission_denied.inc(),
            AuthorizationState::Unchecked => self.late_resolutions_discarded.inc(),
        }
    }

    /// Records a device attach or detach.
    pub fn set_device_attached(&self, attached: bool) {
        self.device_attached.set(i64::from(attached));
    }

    /// Records a mount failure.
    pub fn record_mount_error(&self) {
        self.mount_errors.inc();
    }

    /// Total events forwarded so far.
    pub fn events_forwarded(&self) -> u64 {
        self.events_forwarded.get()
    }

    /// Total events suppressed so far.
    pub fn events_suppressed(&self) -> u64 {
        self.events_suppressed.get()
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_admissions_counted() {
        let registry = MetricsRegistry::new().unwrap();

        registry.record_admission(Admission::Forwarded);
        registry.record_admission(Admission::Suppressed);
        registry.record_admission(Admission::Suppressed);
        registry.record_admission(Admission::NoListener);

        assert_eq!(registry.events_forwarded(), 1);
        assert_eq!(registry.events_suppressed(), 2);
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_authorization(AuthorizationState::Denied);
        registry.set_device_attached(true);

        let output = registry.encode().unwrap();
        assert!(output.contains("camera_gate_permission_denied_total 1"));
        assert!(output.contains("camera_gate_device_attached 1"));
        assert!(output.contains("camera_gate_late_resolutions_discarded_total 0"));
    }
}
