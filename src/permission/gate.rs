//! Permission state machine.

use super::LivenessToken;
use crate::driver::{DriverCapabilities, PermissionProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Whether capture has been authorized.
///
/// Moves from `Unchecked` to one of the terminal states at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationState {
    Unchecked,
    Authorized,
    Denied,
}

/// Status reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraStatus {
    /// The request is outstanding or not yet issued.
    #[serde(rename = "PENDING_AUTHORIZATION")]
    Pending,
    /// Authorized.
    Ready,
    /// Denied.
    NotAuthorized,
}

impl CameraStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            CameraStatus::Pending => "PENDING_AUTHORIZATION",
            CameraStatus::Ready => "READY",
            CameraStatus::NotAuthorized => "NOT_AUTHORIZED",
        }
    }
}

impl From<AuthorizationState> for CameraStatus {
    fn from(state: AuthorizationState) -> Self {
        match state {
            AuthorizationState::Unchecked => CameraStatus::Pending,
            AuthorizationState::Authorized => CameraStatus::Ready,
            AuthorizationState::Denied => CameraStatus::NotAuthorized,
        }
    }
}

impl fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a permission request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionRequest {
    /// Also request microphone access.
    pub requires_audio: bool,
    /// Title of the platform dialog.
    pub dialog_title: String,
    /// Body of the platform dialog.
    pub dialog_message: String,
}

/// Errors starting a permission request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("permission request already issued for this mount")]
    AlreadyRequested,
    #[error("permission gate has been torn down")]
    TornDown,
}

#[derive(Debug)]
struct GateState {
    authorization: AuthorizationState,
    requested: bool,
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks the authorization of one mounted component.
#[derive(Debug)]
pub struct PermissionGate {
    state: Arc<Mutex<GateState>>,
    token: LivenessToken,
}

impl PermissionGate {
    /// Creates a gate for a fresh mount.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState {
                authorization: AuthorizationState::Unchecked,
                requested: false,
            })),
            token: LivenessToken::new(),
        }
    }

    /// Issues the permission request.
    ///
    /// The returned future performs the request and records its answer,
    /// resolving to the resulting state. The answer is discarded if the gate
    /// was torn down by the time the provider resolves; the future then
    /// resolves to [`AuthorizationState::Unchecked`]. The gate is not
    /// blocked while the future is outstanding.
    pub fn initialize(
        &self,
        provider: Arc<dyn PermissionProvider>,
        capabilities: DriverCapabilities,
        request: PermissionRequest,
    ) -> Result<impl Future<Output = AuthorizationState> + Send + 'static, GateError> {
        if !self.token.is_live() {
            return Err(GateError::TornDown);
        }
        {
            let mut state = lock(&self.state);
            if state.requested {
                return Err(GateError::AlreadyRequested);
            }
            state.requested = true;
        }

        let state = Arc::clone(&self.state);
        let token = self.token.clone();
        tracing::debug!(requires_audio = request.requires_audio, "Requesting camera permission");

        Ok(async move {
            let granted = provider
                .request_permissions(
                    request.requires_audio,
                    &capabilities,
                    &request.dialog_title,
                    &request.dialog_message,
                )
                .await;
            Self::resolve(&state, &token, granted)
        })
    }

    fn resolve(state: &Mutex<GateState>, token: &LivenessToken, granted: bool) -> AuthorizationState {
        let mut state = lock(state);
        if !token.is_live() {
            tracing::debug!(granted, "Discarding permission answer after teardown");
            return state.authorization;
        }
        if state.authorization == AuthorizationState::Unchecked {
            state.authorization = if granted {
                AuthorizationState::Authorized
            } else {
                AuthorizationState::Denied
            };
            tracing::info!(state = ?state.authorization, "Camera authorization resolved");
        }
        state.authorization
    }

    /// Current authorization state.
    pub fn state(&self) -> AuthorizationState {
        lock(&self.state).authorization
    }

    /// Current status as reported to callers.
    pub fn status(&self) -> CameraStatus {
        self.state().into()
    }

    /// Returns true once the request has resolved.
    pub fn is_checked(&self) -> bool {
        self.state() != AuthorizationState::Unchecked
    }

    /// Returns true if the request was issued.
    pub fn is_requested(&self) -> bool {
        lock(&self.state).requested
    }

    /// Returns true until the gate is torn down.
    pub fn is_live(&self) -> bool {
        self.token.is_live()
    }

    /// Marks the mount as torn down. Any outstanding answer is discarded.
    ///
    /// Revocation happens under the state lock, so an answer being recorded
    /// concurrently lands either wholly before this returns or not at all.
    pub fn teardown(&self) {
        let _state = lock(&self.state);
        self.token.revoke();
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PermissionGate {
    fn drop(&mut self) {
        self.teardown();
    }
}
