//! Action-level step-up authorization.
//!
//! Flow Overview:
//! 1) A call site configures an [`MfaHandle`] and calls `execute_with_mfa(op)`.
//! 2) The handle opens a challenge on the shared [`ChallengeDesk`]; `op` is held.
//! 3) A [`ChallengePresenter`] collects the 6-digit code and exchanges it for an
//!    action token through an [`ActionVerifier`].
//! 4) The desk routes the [`StepUpArtifact`] to the owning handle, which stores it
//!    in the [`StepUpSlot`] for the gateway, runs `op` once and clears the slot.
//!
//! Security boundary: the action token lives only in memory and is never logged.

mod artifact;
mod code_entry;
mod coordinator;
mod desk;
mod presenter;

pub use artifact::{StepUpArtifact, StepUpSlot};
pub use code_entry::{CODE_LENGTH, CodeEntry, EntryEffect, sanitize_code};
pub use coordinator::{ChallengePhase, MfaHandle, StepUpCoordinator, StepUpOutcome};
pub use desk::{ChallengeDesk, ChallengeView, HandleId, ModalConfig};
pub use presenter::{ActionVerifier, ChallengePresenter, PresenterEvent};
