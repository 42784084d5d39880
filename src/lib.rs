//! # Stepup (action-level MFA for admin operations)
//!
//! `stepup` is the client side of the admin console's step-up authorization
//! protocol. Sensitive mutations (approving KYC, suspending a merchant, changing
//! a team role, rotating backup codes) are paused, challenged with a 6-digit
//! second factor, and resumed only once a short-lived action token has been
//! obtained and attached to the retried request.
//!
//! ## Components
//!
//! - **Credential Store** ([`session`]): the long-lived session token, optional
//!   refresh token and the signed-in principal. One mutation point, persisted to
//!   client-local storage.
//! - **Transport Gateway** ([`api`]): a single `reqwest` client that attaches the
//!   bearer token and the `X-MFA-Token` header, refreshes the session on `401`
//!   with a single-flight gate, and normalizes failures into [`ApiError`].
//! - **Coordinator** ([`step_up`]): per-action handles driving
//!   `Idle → ChallengePending → Verified → Executing → Idle`.
//! - **Challenge Presentation** ([`step_up::ChallengePresenter`]): headless
//!   6-digit entry with paste-fill and auto-submit.
//! - **Call sites** ([`features`]): KYC review, merchant moderation, team roles
//!   and backup codes, each wrapped with the coordinator.
//!
//! ## Flow Overview
//!
//! 1. A call site runs `execute_with_mfa(op)`; the handle opens a challenge on
//!    the shared [`step_up::ChallengeDesk`] and suspends `op`.
//! 2. The presenter collects the code and exchanges it at
//!    `/auth/admin/verify-action-mfa` for an action token.
//! 3. The desk routes the token back to the owning handle, which stores it in
//!    the [`step_up::StepUpSlot`], replays `op` once, and clears the slot when
//!    `op` settles.
//!
//! Token material (session, refresh and action tokens) is held in
//! `secrecy::SecretString` and must never be logged.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod session;
pub mod step_up;

pub use error::{ApiError, ErrorKind};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
