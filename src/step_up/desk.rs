//! The shared challenge surface. Exactly one challenge can be shown at a time;
//! the handle that opened it is recorded as the owner and verified artifacts are
//! routed back to that owner only.
//!
//! A ticket stays on the desk from the moment a handle opens a challenge until its
//! deferred operation settles, so a second handle cannot swap the action token
//! out from under an operation that is still running.

use super::artifact::StepUpArtifact;
use crate::error::ApiError;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::{oneshot, watch};
use tracing::debug;
use uuid::Uuid;

/// Owner token identifying one coordinator handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

/// Labels shown on the challenge surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalConfig {
    pub action_name: String,
    pub action_description: String,
}

/// What a presentation layer renders while a challenge is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeView {
    pub owner: HandleId,
    /// Increments every time a challenge opens; a change means closed → open.
    pub generation: u64,
    pub config: ModalConfig,
}

#[derive(Debug)]
pub(crate) enum Decision {
    Verified(StepUpArtifact),
    Cancelled,
}

struct Ticket {
    owner: HandleId,
    generation: u64,
    // `None` once the challenge is decided and the operation is running.
    decision: Option<oneshot::Sender<Decision>>,
}

#[derive(Default)]
struct DeskState {
    ticket: Option<Ticket>,
    generation: u64,
}

#[derive(Clone)]
pub struct ChallengeDesk {
    state: Arc<Mutex<DeskState>>,
    view: Arc<watch::Sender<Option<ChallengeView>>>,
}

impl Default for ChallengeDesk {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeDesk {
    #[must_use]
    pub fn new() -> Self {
        let (view, _) = watch::channel(None);
        Self {
            state: Arc::new(Mutex::new(DeskState::default())),
            view: Arc::new(view),
        }
    }

    /// Opens a challenge for `owner`.
    ///
    /// # Errors
    /// Returns `ApiError::ChallengeBusy` while another ticket is on the desk.
    pub(crate) fn open(
        &self,
        owner: HandleId,
        config: ModalConfig,
    ) -> Result<oneshot::Receiver<Decision>, ApiError> {
        let mut state = self.lock();
        if state.ticket.is_some() {
            return Err(ApiError::ChallengeBusy);
        }

        state.generation += 1;
        let (tx, rx) = oneshot::channel();
        state.ticket = Some(Ticket {
            owner,
            generation: state.generation,
            decision: Some(tx),
        });
        self.view.send_replace(Some(ChallengeView {
            owner,
            generation: state.generation,
            config,
        }));
        debug!(%owner, generation = state.generation, "challenge opened");
        Ok(rx)
    }

    /// Routes a verified artifact to `owner`'s pending challenge.
    pub fn deliver(&self, owner: HandleId, artifact: StepUpArtifact) -> bool {
        self.decide(owner, None, Decision::Verified(artifact))
    }

    /// Routes a verified artifact to the challenge described by `view`, and only
    /// if that exact challenge is still open.
    pub fn deliver_to(&self, view: &ChallengeView, artifact: StepUpArtifact) -> bool {
        self.decide(view.owner, Some(view.generation), Decision::Verified(artifact))
    }

    /// Cancels `owner`'s pending challenge. No-op if nothing is pending.
    pub fn cancel(&self, owner: HandleId) -> bool {
        self.decide(owner, None, Decision::Cancelled)
    }

    /// Removes `owner`'s ticket once its operation has settled.
    pub(crate) fn release(&self, owner: HandleId) {
        let mut state = self.lock();
        if state.ticket.as_ref().is_some_and(|ticket| ticket.owner == owner) {
            state.ticket = None;
            self.close_view_for(owner);
            debug!(%owner, "challenge released");
        }
    }

    /// The open challenge, if any.
    #[must_use]
    pub fn current(&self) -> Option<ChallengeView> {
        self.view.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ChallengeView>> {
        self.view.subscribe()
    }

    /// True from open until the owner's operation settles.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.lock().ticket.is_some()
    }

    fn decide(&self, owner: HandleId, generation: Option<u64>, decision: Decision) -> bool {
        let mut state = self.lock();
        let Some(ticket) = state.ticket.as_mut() else {
            return false;
        };
        if ticket.owner != owner || generation.is_some_and(|g| g != ticket.generation) {
            return false;
        }
        let Some(sender) = ticket.decision.take() else {
            return false;
        };

        let cancelled = matches!(decision, Decision::Cancelled);
        let delivered = sender.send(decision).is_ok();
        if cancelled || !delivered {
            state.ticket = None;
        }
        self.close_view_for(owner);
        debug!(%owner, cancelled, delivered, "challenge decided");
        delivered
    }

    fn close_view_for(&self, owner: HandleId) {
        self.view.send_if_modified(|view| {
            if view.as_ref().is_some_and(|view| view.owner == owner) {
                *view = None;
                true
            } else {
                false
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, DeskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
