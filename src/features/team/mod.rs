//! Team administration. Changing a member's role requires a step-up code.

pub mod client;
pub mod types;

use super::{ActionReceipt, path_segment};
use crate::{
    api::Gateway,
    error::ApiError,
    step_up::{MfaHandle, StepUpCoordinator, StepUpOutcome},
};

pub const CHANGE_ROLE_ACTION: &str = "Change Role";

#[derive(Clone, Debug)]
pub struct TeamAdmin {
    gateway: Gateway,
    change_role: MfaHandle,
}

impl TeamAdmin {
    #[must_use]
    pub fn new(gateway: Gateway, coordinator: &StepUpCoordinator) -> Self {
        Self {
            gateway,
            change_role: coordinator.configure(
                CHANGE_ROLE_ACTION,
                "Changing a role updates what this team member can access.",
            ),
        }
    }

    #[must_use]
    pub fn on_success(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            gateway: self.gateway,
            change_role: self.change_role.on_success(callback),
        }
    }

    #[must_use]
    pub const fn change_role_handle(&self) -> &MfaHandle {
        &self.change_role
    }

    /// # Errors
    /// Returns `ApiError::Validation` before any challenge opens for invalid
    /// ids, `ApiError::ChallengeBusy` if a challenge is already open, or the
    /// request's error.
    pub async fn change_role(
        &self,
        member_id: &str,
        role_id: &str,
    ) -> Result<StepUpOutcome<ActionReceipt>, ApiError> {
        let member_id = path_segment("team member", member_id)?.to_string();
        let role_id = path_segment("role", role_id)?.to_string();
        let gateway = self.gateway.clone();
        self.change_role
            .execute_with_mfa(|| async move {
                client::change_role(&gateway, &member_id, &role_id).await
            })
            .await
    }
}
