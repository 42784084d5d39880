//! Wires the library pieces for one CLI invocation: file-backed credentials, a
//! gateway, and a coordinator sharing the gateway's step-up slot.

use crate::{
    api::Gateway,
    cli::globals::GlobalArgs,
    session::{CredentialStore, FileTokenStorage, RouteTracker},
    step_up::{ChallengeDesk, ChallengePresenter, StepUpCoordinator, StepUpSlot},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

pub struct Console {
    pub gateway: Gateway,
    pub coordinator: StepUpCoordinator,
    pub navigator: Arc<RouteTracker>,
}

impl Console {
    /// # Errors
    /// Returns an error if the stored session cannot be read or the HTTP client
    /// cannot be built.
    pub fn open(globals: &GlobalArgs) -> Result<Self> {
        let storage = Arc::new(FileTokenStorage::new(globals.token_file.clone()));
        let credentials = CredentialStore::restore(storage).with_context(|| {
            format!("failed to load session from {}", globals.token_file.display())
        })?;
        debug!(
            token_file = %globals.token_file.display(),
            authenticated = credentials.is_authenticated(),
            "session store opened"
        );

        let slot = StepUpSlot::default();
        let coordinator = StepUpCoordinator::new(ChallengeDesk::new(), slot.clone());
        let navigator = Arc::new(RouteTracker::default());
        let gateway = Gateway::new(globals.api.clone(), credentials, slot, navigator.clone())?;

        Ok(Self {
            gateway,
            coordinator,
            navigator,
        })
    }

    #[must_use]
    pub fn presenter(&self) -> ChallengePresenter<Gateway> {
        ChallengePresenter::new(self.coordinator.desk().clone(), self.gateway.clone())
    }
}
