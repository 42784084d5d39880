//! Step-up challenge coordinator.
//!
//! A handle is configured once per protected action (approve, reject, suspend,
//! ...) and can be reused for any number of sequential calls. Each call walks:
//!
//! ```text
//! Idle → ChallengePending → Verified → Executing → Idle   (succeeded or failed)
//!              └──────────→ Idle                           (cancelled)
//! ```
//!
//! The deferred operation is never polled before a verified artifact arrives, runs
//! at most once, and the artifact is cleared as soon as it settles.

use super::{
    artifact::StepUpSlot,
    desk::{ChallengeDesk, Decision, HandleId, ModalConfig},
};
use crate::error::ApiError;
use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengePhase {
    Idle,
    ChallengePending,
    Verified,
    Executing,
}

/// Result of a protected call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepUpOutcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> StepUpOutcome<T> {
    #[must_use]
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StepUpOutcome<U> {
        match self {
            Self::Completed(value) => StepUpOutcome::Completed(f(value)),
            Self::Cancelled => StepUpOutcome::Cancelled,
        }
    }
}

type SuccessCallback = Arc<dyn Fn() + Send + Sync>;

/// Hands out handles that share one challenge desk and one artifact slot.
#[derive(Clone)]
pub struct StepUpCoordinator {
    desk: ChallengeDesk,
    slot: StepUpSlot,
}

impl StepUpCoordinator {
    #[must_use]
    pub const fn new(desk: ChallengeDesk, slot: StepUpSlot) -> Self {
        Self { desk, slot }
    }

    #[must_use]
    pub const fn desk(&self) -> &ChallengeDesk {
        &self.desk
    }

    #[must_use]
    pub const fn slot(&self) -> &StepUpSlot {
        &self.slot
    }

    /// Configures a handle for one protected action.
    #[must_use]
    pub fn configure(
        &self,
        action_name: impl Into<String>,
        action_description: impl Into<String>,
    ) -> MfaHandle {
        MfaHandle {
            inner: Arc::new(HandleInner {
                id: HandleId::new(),
                config: ModalConfig {
                    action_name: action_name.into(),
                    action_description: action_description.into(),
                },
                phase: Mutex::new(ChallengePhase::Idle),
                on_success: Mutex::new(None),
                desk: self.desk.clone(),
                slot: self.slot.clone(),
            }),
        }
    }
}

struct HandleInner {
    id: HandleId,
    config: ModalConfig,
    phase: Mutex<ChallengePhase>,
    on_success: Mutex<Option<SuccessCallback>>,
    desk: ChallengeDesk,
    slot: StepUpSlot,
}

#[derive(Clone)]
pub struct MfaHandle {
    inner: Arc<HandleInner>,
}

impl MfaHandle {
    /// Registers a callback fired once after each successful protected call.
    #[must_use]
    pub fn on_success(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        *self
            .inner
            .on_success
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    #[must_use]
    pub fn modal_config(&self) -> &ModalConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn phase(&self) -> ChallengePhase {
        *self.phase_lock()
    }

    #[must_use]
    pub fn is_mfa_modal_open(&self) -> bool {
        self.phase() == ChallengePhase::ChallengePending
    }

    /// True while a challenge is pending or the operation is running; the
    /// triggering control should be disabled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase() != ChallengePhase::Idle
    }

    /// Cancels the pending challenge. Safe to call at any time.
    pub fn close_mfa_modal(&self) {
        if self.inner.desk.cancel(self.inner.id) {
            info!(action = %self.inner.config.action_name, "step-up challenge cancelled");
        }
    }

    /// Delivers a verified artifact to this handle's pending challenge.
    /// Returns `false` if this handle has nothing pending.
    pub fn handle_mfa_verified(&self, artifact: super::StepUpArtifact) -> bool {
        self.inner.desk.deliver(self.inner.id, artifact)
    }

    /// Runs `operation` behind a step-up challenge.
    ///
    /// The action token is cleared from the slot as soon as `operation` settles,
    /// before the `on_success` callback fires. A callback that issues requests
    /// therefore never carries a spent token.
    ///
    /// # Errors
    /// Returns `ApiError::ChallengeBusy` if this handle (or another handle sharing
    /// the desk) already has a challenge in progress, `ApiError::StepUpInvalid` if
    /// the artifact expired before the replay, or the operation's own error.
    pub async fn execute_with_mfa<F, Fut, T>(&self, operation: F) -> Result<StepUpOutcome<T>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let inner = &self.inner;
        let decision = {
            let mut phase = self.phase_lock();
            if *phase != ChallengePhase::Idle {
                return Err(ApiError::ChallengeBusy);
            }
            let decision = inner.desk.open(inner.id, inner.config.clone())?;
            *phase = ChallengePhase::ChallengePending;
            decision
        };
        let _reset = PhaseReset { handle: self };
        debug!(action = %inner.config.action_name, "step-up challenge pending");

        let artifact = match decision.await {
            Ok(Decision::Verified(artifact)) => artifact,
            Ok(Decision::Cancelled) | Err(_) => return Ok(StepUpOutcome::Cancelled),
        };
        self.set_phase(ChallengePhase::Verified);

        if artifact.is_expired() {
            warn!(action = %inner.config.action_name, "action token expired before use");
            return Err(ApiError::StepUpInvalid(
                "Verification expired. Please try again.".to_string(),
            ));
        }

        let result = {
            let _lease = inner.slot.lease(artifact);
            self.set_phase(ChallengePhase::Executing);
            operation().await
        };

        match result {
            Ok(value) => {
                info!(action = %inner.config.action_name, "protected action completed");
                let callback = inner
                    .on_success
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                if let Some(callback) = callback {
                    callback();
                }
                Ok(StepUpOutcome::Completed(value))
            }
            Err(err) => {
                warn!(action = %inner.config.action_name, "protected action failed: {err}");
                Err(err)
            }
        }
    }

    fn set_phase(&self, next: ChallengePhase) {
        let mut phase = self.phase_lock();
        debug!(action = %self.inner.config.action_name, from = ?*phase, to = ?next, "phase");
        *phase = next;
    }

    fn phase_lock(&self) -> MutexGuard<'_, ChallengePhase> {
        self.inner.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MfaHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MfaHandle")
            .field("id", &self.inner.id)
            .field("action", &self.inner.config.action_name)
            .field("phase", &self.phase())
            .finish()
    }
}

/// Returns the handle to `Idle` and frees the desk however the call ends.
struct PhaseReset<'a> {
    handle: &'a MfaHandle,
}

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        let inner = &self.handle.inner;
        inner.desk.cancel(inner.id);
        inner.desk.release(inner.id);
        *self.handle.phase_lock() = ChallengePhase::Idle;
    }
}
