//! Headless challenge presentation.
//!
//! The presenter follows the desk, owns the 6-digit buffer and exchanges a complete
//! code for an action token. Rendering is left to the caller (the terminal prompt
//! in [`crate::cli`], or any other front end) which reacts to [`PresenterEvent`]s.

use super::{
    artifact::StepUpArtifact,
    code_entry::{CODE_LENGTH, CodeEntry, EntryEffect},
    desk::{ChallengeDesk, ChallengeView},
};
use crate::error::ApiError;
use std::future::Future;
use tracing::{debug, info};

/// Exchanges a verification code for an action token.
pub trait ActionVerifier: Send + Sync {
    fn verify_action(
        &self,
        code: &str,
        action: Option<&str>,
    ) -> impl Future<Output = Result<StepUpArtifact, ApiError>> + Send;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresenterEvent {
    /// Nothing is open.
    Idle,
    /// Buffer changed; move focus to this box.
    Editing { focus: usize },
    /// Rejected locally; no request was sent.
    Invalid(String),
    /// The server rejected the code. The buffer was reset and the challenge stays open.
    Rejected(String),
    /// The action token was routed to the owning handle.
    Verified,
    /// The challenge closed without an artifact.
    Closed,
}

pub struct ChallengePresenter<V> {
    desk: ChallengeDesk,
    verifier: V,
    view: Option<ChallengeView>,
    entry: CodeEntry,
    error: Option<String>,
    verifying: bool,
}

impl<V: ActionVerifier> ChallengePresenter<V> {
    #[must_use]
    pub fn new(desk: ChallengeDesk, verifier: V) -> Self {
        Self {
            desk,
            verifier,
            view: None,
            entry: CodeEntry::new(),
            error: None,
            verifying: false,
        }
    }

    /// Picks up the desk's current challenge. A new generation resets the buffer.
    pub fn sync(&mut self) -> Option<&ChallengeView> {
        let current = self.desk.current();
        let reopened = match (&self.view, &current) {
            (Some(seen), Some(now)) => seen.generation != now.generation,
            (None, Some(_)) => true,
            _ => false,
        };
        if reopened || current.is_none() {
            self.entry.reset();
            self.error = None;
            self.verifying = false;
        }
        self.view = current;
        self.view.as_ref()
    }

    #[must_use]
    pub const fn view(&self) -> Option<&ChallengeView> {
        self.view.as_ref()
    }

    #[must_use]
    pub const fn entry(&self) -> &CodeEntry {
        &self.entry
    }

    /// Inline error from the last failed submission.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_verifying(&self) -> bool {
        self.verifying
    }

    pub async fn input(&mut self, index: usize, value: char) -> PresenterEvent {
        let effect = self.entry.input(index, value);
        self.apply(effect).await
    }

    pub async fn paste(&mut self, text: &str) -> PresenterEvent {
        let effect = self.entry.paste(text);
        self.apply(effect).await
    }

    pub fn backspace(&mut self, index: usize) -> PresenterEvent {
        match self.entry.backspace(index) {
            EntryEffect::Focus(focus) => PresenterEvent::Editing { focus },
            EntryEffect::Submit | EntryEffect::Ignored => PresenterEvent::Editing {
                focus: self.entry.focus(),
            },
        }
    }

    /// Submits the buffer. Fewer than six digits never reaches the network.
    pub async fn submit(&mut self) -> PresenterEvent {
        let Some(view) = self.view.clone() else {
            return PresenterEvent::Idle;
        };
        if self.verifying {
            return PresenterEvent::Editing {
                focus: self.entry.focus(),
            };
        }

        let code = self.entry.code();
        if code.len() != CODE_LENGTH {
            let message = format!("Please enter a {CODE_LENGTH}-digit code");
            self.error = Some(message.clone());
            return PresenterEvent::Invalid(message);
        }

        self.verifying = true;
        self.error = None;
        debug!(action = %view.config.action_name, "verifying action code");
        let result = self
            .verifier
            .verify_action(&code, Some(&view.config.action_name))
            .await;
        self.verifying = false;

        match result {
            Ok(artifact) => {
                self.entry.reset();
                if self.desk.deliver_to(&view, artifact) {
                    info!(action = %view.config.action_name, "action code verified");
                    self.view = None;
                    PresenterEvent::Verified
                } else {
                    // Cancelled or replaced while the request was in flight.
                    self.sync();
                    PresenterEvent::Closed
                }
            }
            Err(err) => {
                self.entry.reset();
                let message = err.user_message();
                self.error = Some(message.clone());
                PresenterEvent::Rejected(message)
            }
        }
    }

    /// Closes the open challenge without routing an artifact.
    pub fn cancel(&mut self) -> PresenterEvent {
        if let Some(view) = self.view.take() {
            self.desk.cancel(view.owner);
        }
        self.entry.reset();
        self.error = None;
        PresenterEvent::Closed
    }

    async fn apply(&mut self, effect: EntryEffect) -> PresenterEvent {
        match effect {
            EntryEffect::Submit => self.submit().await,
            EntryEffect::Focus(focus) => PresenterEvent::Editing { focus },
            EntryEffect::Ignored => PresenterEvent::Editing {
                focus: self.entry.focus(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step_up::desk::HandleId;
    use crate::step_up::desk::{Decision, ModalConfig};
    use secrecy::{ExposeSecret, SecretString};
    use std::{
        sync::{
            Arc, Mutex, PoisonError,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[derive(Clone, Default)]
    struct FakeVerifier {
        calls: Arc<AtomicUsize>,
        codes: Arc<Mutex<Vec<(String, Option<String>)>>>,
    }

    impl ActionVerifier for FakeVerifier {
        fn verify_action(
            &self,
            code: &str,
            action: Option<&str>,
        ) -> impl Future<Output = Result<StepUpArtifact, ApiError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.codes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((code.to_string(), action.map(str::to_string)));
            let result = if code == "123456" {
                Ok(StepUpArtifact::new(
                    SecretString::from("tok_abc"),
                    Duration::from_secs(300),
                ))
            } else {
                Err(ApiError::StepUpInvalid("Invalid code".to_string()))
            };
            async move { result }
        }
    }

    fn open(desk: &ChallengeDesk) -> Result<(HandleId, tokio::sync::oneshot::Receiver<Decision>), ApiError> {
        let owner = HandleId::new();
        let rx = desk.open(
            owner,
            ModalConfig {
                action_name: "Approve KYC".to_string(),
                action_description: "Approve the KYC submission".to_string(),
            },
        )?;
        Ok((owner, rx))
    }

    #[tokio::test]
    async fn full_paste_submits_and_routes_artifact() -> Result<(), ApiError> {
        let desk = ChallengeDesk::new();
        let verifier = FakeVerifier::default();
        let mut presenter = ChallengePresenter::new(desk.clone(), verifier.clone());
        let (_owner, rx) = open(&desk)?;
        assert!(presenter.sync().is_some());

        assert_eq!(presenter.paste("12a3456").await, PresenterEvent::Verified);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            verifier.codes.lock().unwrap_or_else(PoisonError::into_inner)[0],
            ("123456".to_string(), Some("Approve KYC".to_string()))
        );

        match rx.await {
            Ok(Decision::Verified(artifact)) => {
                assert_eq!(artifact.token().expose_secret(), "tok_abc");
            }
            other => panic!("expected verified decision, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn short_code_is_rejected_without_network() -> Result<(), ApiError> {
        let desk = ChallengeDesk::new();
        let verifier = FakeVerifier::default();
        let mut presenter = ChallengePresenter::new(desk.clone(), verifier.clone());
        let _ticket = open(&desk)?;
        presenter.sync();

        assert_eq!(presenter.paste("12").await, PresenterEvent::Editing { focus: 2 });
        assert!(matches!(presenter.submit().await, PresenterEvent::Invalid(_)));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert!(presenter.error().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn wrong_code_resets_buffer_and_keeps_challenge_open() -> Result<(), ApiError> {
        let desk = ChallengeDesk::new();
        let mut presenter = ChallengePresenter::new(desk.clone(), FakeVerifier::default());
        let _ticket = open(&desk)?;
        presenter.sync();

        let event = presenter.paste("000000").await;
        assert_eq!(event, PresenterEvent::Rejected("Invalid code".to_string()));
        assert_eq!(presenter.entry().code(), "");
        assert_eq!(presenter.entry().focus(), 0);
        assert_eq!(presenter.error(), Some("Invalid code"));
        assert!(desk.current().is_some());

        assert_eq!(presenter.paste("123456").await, PresenterEvent::Verified);
        assert!(presenter.error().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn typing_sixth_digit_auto_submits() -> Result<(), ApiError> {
        let desk = ChallengeDesk::new();
        let mut presenter = ChallengePresenter::new(desk.clone(), FakeVerifier::default());
        let _ticket = open(&desk)?;
        presenter.sync();

        for (index, digit) in "12345".chars().enumerate() {
            assert_eq!(
                presenter.input(index, digit).await,
                PresenterEvent::Editing { focus: index + 1 }
            );
        }
        assert_eq!(presenter.input(5, '6').await, PresenterEvent::Verified);
        Ok(())
    }

    #[tokio::test]
    async fn cancel_closes_without_artifact() -> Result<(), ApiError> {
        let desk = ChallengeDesk::new();
        let verifier = FakeVerifier::default();
        let mut presenter = ChallengePresenter::new(desk.clone(), verifier.clone());
        let (_owner, rx) = open(&desk)?;
        presenter.sync();
        presenter.paste("123").await;

        assert_eq!(presenter.cancel(), PresenterEvent::Closed);
        assert!(matches!(rx.await, Ok(Decision::Cancelled)));
        assert!(desk.current().is_none());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(presenter.submit().await, PresenterEvent::Idle);
        Ok(())
    }

    #[tokio::test]
    async fn reopening_resets_the_buffer() -> Result<(), ApiError> {
        let desk = ChallengeDesk::new();
        let mut presenter = ChallengePresenter::new(desk.clone(), FakeVerifier::default());
        let (owner, _rx) = open(&desk)?;
        presenter.sync();
        presenter.paste("12").await;
        assert_eq!(presenter.entry().code(), "12");

        desk.cancel(owner);
        let _next = open(&desk)?;
        presenter.sync();
        assert_eq!(presenter.entry().code(), "");
        Ok(())
    }
}
