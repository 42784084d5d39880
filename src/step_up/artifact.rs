//! The step-up action token and the in-memory slot the gateway reads it from.
//! The slot is never persisted and its contents are never logged.

use secrecy::SecretString;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

/// Short-lived proof that a step-up challenge was just satisfied.
#[derive(Clone, Debug)]
pub struct StepUpArtifact {
    token: SecretString,
    issued_at: Instant,
    expires_in: Duration,
}

impl StepUpArtifact {
    #[must_use]
    pub fn new(token: SecretString, expires_in: Duration) -> Self {
        Self {
            token,
            issued_at: Instant::now(),
            expires_in,
        }
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn issued_at(&self) -> Instant {
        self.issued_at
    }

    #[must_use]
    pub const fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Best-effort local check; the server stays authoritative. A zero TTL means
    /// the server did not declare one.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        !self.expires_in.is_zero() && self.issued_at.elapsed() >= self.expires_in
    }
}

/// Process-wide holder for the current action token.
#[derive(Clone, Default)]
pub struct StepUpSlot {
    current: Arc<Mutex<Option<StepUpArtifact>>>,
}

impl StepUpSlot {
    /// Stores `artifact` until the returned lease is dropped.
    pub(crate) fn lease(&self, artifact: StepUpArtifact) -> ArtifactLease<'_> {
        *self.lock() = Some(artifact);
        debug!("action token stored");
        ArtifactLease { slot: self }
    }

    /// Current token, read by the gateway on every outgoing request.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.lock().as_ref().map(|artifact| artifact.token.clone())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    pub fn clear(&self) {
        if self.lock().take().is_some() {
            debug!("action token cleared");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<StepUpArtifact>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for StepUpSlot {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("StepUpSlot")
            .field("occupied", &!self.is_empty())
            .finish()
    }
}

/// Clears the slot when dropped, including when the owning future is abandoned.
pub(crate) struct ArtifactLease<'a> {
    slot: &'a StepUpSlot,
}

impl Drop for ArtifactLease<'_> {
    fn drop(&mut self) {
        self.slot.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn lease_clears_on_drop() {
        let slot = StepUpSlot::default();
        {
            let _lease = slot.lease(StepUpArtifact::new(
                SecretString::from("tok_abc"),
                Duration::from_secs(300),
            ));
            assert_eq!(
                slot.token().map(|t| t.expose_secret().to_string()),
                Some("tok_abc".to_string())
            );
        }
        assert!(slot.is_empty());
    }

    #[test]
    fn zero_ttl_never_expires_locally() {
        let artifact = StepUpArtifact::new(SecretString::from("tok"), Duration::ZERO);
        assert!(!artifact.is_expired());
    }

    #[tokio::test]
    async fn artifact_expires_after_ttl() {
        let artifact = StepUpArtifact::new(SecretString::from("tok"), Duration::from_millis(20));
        assert!(!artifact.is_expired());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(artifact.is_expired());
    }

    #[test]
    fn debug_output_hides_token() {
        let slot = StepUpSlot::default();
        let _lease = slot.lease(StepUpArtifact::new(
            SecretString::from("tok_secret"),
            Duration::from_secs(60),
        ));
        let rendered = format!("{slot:?}");
        assert!(!rendered.contains("tok_secret"));
        assert!(rendered.contains("occupied: true"));
    }
}
