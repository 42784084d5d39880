//! Admin authentication: password login, login-time MFA, logout, password reset,
//! and the action-code exchange used by step-up challenges.

pub mod client;
pub mod types;

pub use client::{forgot_password, login, logout, set_password, verify_action_mfa, verify_login_mfa};
pub use types::{LoginOutcome, PendingLogin};
