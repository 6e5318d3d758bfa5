//! Mount liveness token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag marking whether a mount is still live.
///
/// Clones observe the same flag. Revocation is one-way.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    live: Arc<AtomicBool>,
}

impl LivenessToken {
    /// Creates a live token.
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns true until [`revoke`](Self::revoke) is called on any clone.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Marks the mount as torn down.
    pub fn revoke(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_visible_to_clones() {
        let token = LivenessToken::new();
        let held = token.clone();
        assert!(held.is_live());

        token.revoke();
        assert!(!held.is_live());
    }
}
