//! Merchant moderation: approve, reject and suspend, each behind its own
//! step-up handle so a pending approval never shares state with a rejection.

pub mod client;
pub mod types;

pub use types::MerchantDecision;

use super::{ActionReceipt, path_segment, required_reason};
use crate::{
    api::Gateway,
    error::ApiError,
    step_up::{MfaHandle, StepUpCoordinator, StepUpOutcome},
};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct MerchantModeration {
    gateway: Gateway,
    approve: MfaHandle,
    reject: MfaHandle,
    suspend: MfaHandle,
}

impl MerchantModeration {
    #[must_use]
    pub fn new(gateway: Gateway, coordinator: &StepUpCoordinator) -> Self {
        let handle = |decision: MerchantDecision, description: &str| {
            coordinator.configure(decision.action_name(), description)
        };
        Self {
            gateway,
            approve: handle(
                MerchantDecision::Approve,
                "Approving a merchant enables payment processing.",
            ),
            reject: handle(
                MerchantDecision::Reject,
                "Rejecting a merchant closes the application.",
            ),
            suspend: handle(
                MerchantDecision::Suspend,
                "Suspending a merchant halts all payment processing.",
            ),
        }
    }

    #[must_use]
    pub fn on_success(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        let callback = Arc::new(callback);
        let (approve, reject) = (Arc::clone(&callback), Arc::clone(&callback));
        Self {
            gateway: self.gateway,
            approve: self.approve.on_success(move || approve()),
            reject: self.reject.on_success(move || reject()),
            suspend: self.suspend.on_success(move || callback()),
        }
    }

    #[must_use]
    pub const fn handle(&self, decision: MerchantDecision) -> &MfaHandle {
        match decision {
            MerchantDecision::Approve => &self.approve,
            MerchantDecision::Reject => &self.reject,
            MerchantDecision::Suspend => &self.suspend,
        }
    }

    /// Runs `decision` behind a step-up challenge.
    ///
    /// # Errors
    /// Returns `ApiError::Validation` before any challenge opens for an invalid
    /// id or a missing reason, `ApiError::ChallengeBusy` if a challenge is
    /// already open, or the request's error.
    pub async fn decide(
        &self,
        merchant_id: &str,
        decision: MerchantDecision,
        reason: Option<&str>,
    ) -> Result<StepUpOutcome<ActionReceipt>, ApiError> {
        let merchant_id = path_segment("merchant", merchant_id)?.to_string();
        let reason = if decision.requires_reason() {
            Some(required_reason(reason.unwrap_or_default(), decision.segment())?)
        } else {
            None
        };
        let gateway = self.gateway.clone();
        self.handle(decision)
            .execute_with_mfa(|| async move {
                client::moderate(&gateway, &merchant_id, decision, reason.as_deref()).await
            })
            .await
    }

    /// # Errors
    /// See [`MerchantModeration::decide`].
    pub async fn approve(&self, merchant_id: &str) -> Result<StepUpOutcome<ActionReceipt>, ApiError> {
        self.decide(merchant_id, MerchantDecision::Approve, None).await
    }

    /// # Errors
    /// See [`MerchantModeration::decide`].
    pub async fn reject(
        &self,
        merchant_id: &str,
        reason: &str,
    ) -> Result<StepUpOutcome<ActionReceipt>, ApiError> {
        self.decide(merchant_id, MerchantDecision::Reject, Some(reason)).await
    }

    /// # Errors
    /// See [`MerchantModeration::decide`].
    pub async fn suspend(
        &self,
        merchant_id: &str,
        reason: &str,
    ) -> Result<StepUpOutcome<ActionReceipt>, ApiError> {
        self.decide(merchant_id, MerchantDecision::Suspend, Some(reason)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_approve_skips_the_reason() {
        assert!(!MerchantDecision::Approve.requires_reason());
        assert!(MerchantDecision::Reject.requires_reason());
        assert!(MerchantDecision::Suspend.requires_reason());
        assert_eq!(MerchantDecision::Suspend.segment(), "suspend");
        assert_eq!(MerchantDecision::Approve.action_name(), "Approve Merchant");
    }
}
