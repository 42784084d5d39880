//! Account security settings. Rotating backup codes requires a step-up code.

pub mod client;
pub mod types;

use crate::{
    api::Gateway,
    error::ApiError,
    step_up::{MfaHandle, StepUpCoordinator, StepUpOutcome},
};

pub const ROTATE_BACKUP_CODES_ACTION: &str = "Regenerate Backup Codes";

#[derive(Clone, Debug)]
pub struct BackupCodes {
    gateway: Gateway,
    rotate: MfaHandle,
}

impl BackupCodes {
    #[must_use]
    pub fn new(gateway: Gateway, coordinator: &StepUpCoordinator) -> Self {
        Self {
            gateway,
            rotate: coordinator.configure(
                ROTATE_BACKUP_CODES_ACTION,
                "Your existing backup codes will stop working.",
            ),
        }
    }

    #[must_use]
    pub const fn rotate_handle(&self) -> &MfaHandle {
        &self.rotate
    }

    /// # Errors
    /// Returns `ApiError::ChallengeBusy` if a challenge is already open, or the
    /// request's error.
    pub async fn rotate(&self) -> Result<StepUpOutcome<Vec<String>>, ApiError> {
        let gateway = self.gateway.clone();
        self.rotate
            .execute_with_mfa(|| async move { client::regenerate_backup_codes(&gateway).await })
            .await
    }
}
