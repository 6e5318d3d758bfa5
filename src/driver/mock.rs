//! Mock driver and permission providers for testing and the session CLI.

use super::{CaptureDriver, DeviceHandle, DriverCapabilities, DriverError, PermissionProvider, Platform};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call received by [`MockDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    Pause(DeviceHandle),
    Resume(DeviceHandle),
    SupportedRatios(DeviceHandle),
}

/// In-memory driver that records every call it receives.
#[derive(Debug)]
pub struct MockDriver {
    platform: Platform,
    capabilities: DriverCapabilities,
    ratios: Vec<String>,
    calls: Mutex<Vec<DriverCall>>,
    paused: Mutex<HashSet<DeviceHandle>>,
    failing: AtomicBool,
}

impl MockDriver {
    /// Creates a driver publishing the given platform's descriptor.
    pub fn new(platform: Platform) -> Self {
        Self::with_capabilities(platform, DriverCapabilities::for_platform(platform))
    }

    /// Creates a driver with an explicit capability descriptor.
    pub fn with_capabilities(platform: Platform, capabilities: DriverCapabilities) -> Self {
        Self {
            platform,
            capabilities,
            ratios: ["4:3", "16:9", "1:1"].iter().map(|r| r.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
            paused: Mutex::new(HashSet::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent imperative call fail with [`DriverError::CallFailed`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the calls received so far, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        lock(&self.calls).clone()
    }

    /// Returns true if the preview of `handle` is currently paused.
    pub fn is_paused(&self, handle: DeviceHandle) -> bool {
        lock(&self.paused).contains(&handle)
    }

    fn record(&self, call: DriverCall) -> Result<(), DriverError> {
        lock(&self.calls).push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DriverError::CallFailed(format!("{call:?} rejected by mock")));
        }
        Ok(())
    }
}

#[async_trait]
impl CaptureDriver for MockDriver {
    fn capabilities(&self) -> &DriverCapabilities {
        &self.capabilities
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn pause_preview(&self, handle: DeviceHandle) -> Result<(), DriverError> {
        self.record(DriverCall::Pause(handle))?;
        lock(&self.paused).insert(handle);
        tracing::debug!(%handle, "MockDriver preview paused");
        Ok(())
    }

    fn resume_preview(&self, handle: DeviceHandle) -> Result<(), DriverError> {
        self.record(DriverCall::Resume(handle))?;
        lock(&self.paused).remove(&handle);
        tracing::debug!(%handle, "MockDriver preview resumed");
        Ok(())
    }

    async fn supported_ratios(&self, handle: DeviceHandle) -> Result<Vec<String>, DriverError> {
        self.record(DriverCall::SupportedRatios(handle))?;
        if !self.platform.supports_ratio() {
            return Err(DriverError::Unsupported {
                platform: self.platform,
                operation: "ratio enumeration",
            });
        }
        Ok(self.ratios.clone())
    }
}

/// Provider that always answers the same way, optionally after a delay.
#[derive(Debug)]
pub struct StaticPermissionProvider {
    granted: bool,
    delay: Duration,
    requests: AtomicUsize,
}

impl StaticPermissionProvider {
    /// Provider that resolves immediately.
    pub fn new(granted: bool) -> Self {
        Self::with_delay(granted, Duration::ZERO)
    }

    /// Provider that resolves after `delay`, simulating the user answering a dialog.
    pub fn with_delay(granted: bool, delay: Duration) -> Self {
        Self {
            granted,
            delay,
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of permission requests received.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissionProvider {
    async fn request_permissions(
        &self,
        requires_audio: bool,
        _capabilities: &DriverCapabilities,
        dialog_title: &str,
        _dialog_message: &str,
    ) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(requires_audio, dialog_title, "Permission requested");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.granted
    }
}

/// Provider whose answer is supplied later through a [`PermissionResolver`].
///
/// Serves a single request. If the resolver is dropped without answering,
/// the request never resolves.
#[derive(Debug)]
pub struct ManualPermissionProvider {
    answer: Mutex<Option<oneshot::Receiver<bool>>>,
}

/// Resolves the pending request of a [`ManualPermissionProvider`].
#[derive(Debug)]
pub struct PermissionResolver {
    sender: oneshot::Sender<bool>,
}

impl ManualPermissionProvider {
    /// Creates a provider and the resolver that answers it.
    pub fn new() -> (Self, PermissionResolver) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                answer: Mutex::new(Some(receiver)),
            },
            PermissionResolver { sender },
        )
    }
}

impl PermissionResolver {
    /// Answers the pending request.
    pub fn resolve(self, granted: bool) {
        // The receiver is gone only if the request future was dropped.
        let _ = self.sender.send(granted);
    }
}

#[async_trait]
impl PermissionProvider for ManualPermissionProvider {
    async fn request_permissions(
        &self,
        _requires_audio: bool,
        _capabilities: &DriverCapabilities,
        _dialog_title: &str,
        _dialog_message: &str,
    ) -> bool {
        let receiver = lock(&self.answer).take();
        match receiver {
            Some(receiver) => match receiver.await {
                Ok(granted) => granted,
                Err(_) => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_driver_pause_resume() {
        let driver = MockDriver::new(Platform::Android);
        let handle = DeviceHandle::new(7);

        driver.pause_preview(handle).unwrap();
        assert!(driver.is_paused(handle));

        driver.resume_preview(handle).unwrap();
        assert!(!driver.is_paused(handle));

        assert_eq!(
            driver.calls(),
            vec![DriverCall::Pause(handle), DriverCall::Resume(handle)]
        );
    }

    #[test]
    fn test_failing_driver() {
        let driver = MockDriver::new(Platform::Android);
        driver.set_failing(true);
        assert!(matches!(
            driver.pause_preview(DeviceHandle::new(1)),
            Err(DriverError::CallFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_ratios_unsupported_on_ios() {
        let driver = MockDriver::new(Platform::Ios);
        let result = driver.supported_ratios(DeviceHandle::new(1)).await;
        assert!(matches!(result, Err(DriverError::Unsupported { .. })));
    }

    #[tokio::test]
    async fn test_manual_provider_resolves() {
        let (provider, resolver) = ManualPermissionProvider::new();
        resolver.resolve(true);
        let caps = DriverCapabilities::stub();
        assert!(provider.request_permissions(false, &caps, "", "").await);
    }

    #[tokio::test]
    async fn test_static_provider_counts_requests() {
        let provider = StaticPermissionProvider::new(false);
        let caps = DriverCapabilities::stub();
        assert!(!provider.request_permissions(false, &caps, "Camera", "").await);
        assert_eq!(provider.request_count(), 1);
    }
}
