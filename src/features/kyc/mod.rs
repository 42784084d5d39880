//! KYC review. Approving or rejecting a submission requires a step-up code.

pub mod client;
pub mod types;

use super::{ActionReceipt, path_segment, required_reason};
use crate::{
    api::Gateway,
    error::ApiError,
    step_up::{MfaHandle, StepUpCoordinator, StepUpOutcome},
};
use std::sync::Arc;

pub const APPROVE_ACTION: &str = "Approve KYC";
pub const REJECT_ACTION: &str = "Reject KYC";

#[derive(Clone, Debug)]
pub struct KycReview {
    gateway: Gateway,
    approve: MfaHandle,
    reject: MfaHandle,
}

impl KycReview {
    #[must_use]
    pub fn new(gateway: Gateway, coordinator: &StepUpCoordinator) -> Self {
        Self {
            gateway,
            approve: coordinator.configure(
                APPROVE_ACTION,
                "Approving a KYC submission verifies the user's identity.",
            ),
            reject: coordinator.configure(
                REJECT_ACTION,
                "Rejecting a KYC submission requires the user to resubmit.",
            ),
        }
    }

    /// Fires after every successful approval or rejection, e.g. to refetch.
    #[must_use]
    pub fn on_success(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        let callback = Arc::new(callback);
        let shared = Arc::clone(&callback);
        Self {
            gateway: self.gateway,
            approve: self.approve.on_success(move || shared()),
            reject: self.reject.on_success(move || callback()),
        }
    }

    #[must_use]
    pub const fn approve_handle(&self) -> &MfaHandle {
        &self.approve
    }

    #[must_use]
    pub const fn reject_handle(&self) -> &MfaHandle {
        &self.reject
    }

    /// # Errors
    /// Returns `ApiError::Validation` before any challenge opens for an invalid
    /// id, `ApiError::ChallengeBusy` if a challenge is already open, or the
    /// request's error.
    pub async fn approve(&self, user_id: &str) -> Result<StepUpOutcome<ActionReceipt>, ApiError> {
        let user_id = path_segment("user", user_id)?.to_string();
        let gateway = self.gateway.clone();
        self.approve
            .execute_with_mfa(|| async move { client::approve(&gateway, &user_id).await })
            .await
    }

    /// # Errors
    /// Returns `ApiError::Validation` before any challenge opens for an invalid
    /// id or a blank reason, `ApiError::ChallengeBusy` if a challenge is already
    /// open, or the request's error.
    pub async fn reject(
        &self,
        user_id: &str,
        reason: &str,
    ) -> Result<StepUpOutcome<ActionReceipt>, ApiError> {
        let user_id = path_segment("user", user_id)?.to_string();
        let reason = required_reason(reason, "reject this KYC submission")?;
        let gateway = self.gateway.clone();
        self.reject
            .execute_with_mfa(|| async move { client::reject(&gateway, &user_id, &reason).await })
            .await
    }
}
