//! Error taxonomy surfaced by the gateway, the coordinator and the call sites.
//! Every transport or HTTP failure is normalized into [`ApiError`] before it
//! reaches callers; messages are already user-facing and never contain token
//! material.

use thiserror::Error;

/// Coarse error categories used by callers to pick a presentation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthenticationExpired,
    StepUpRequired,
    StepUpInvalid,
    Validation,
    Transient,
    Server,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Session expired: {0}")]
    AuthenticationExpired(String),
    #[error("Verification required: {0}")]
    StepUpRequired(String),
    #[error("Verification failed: {0}")]
    StepUpInvalid(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Another verification is already in progress")]
    ChallengeBusy,
}

impl ApiError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationExpired(_) => ErrorKind::AuthenticationExpired,
            Self::StepUpRequired(_) => ErrorKind::StepUpRequired,
            Self::StepUpInvalid(_) => ErrorKind::StepUpInvalid,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Timeout(_) | Self::Network(_) => ErrorKind::Transient,
            Self::Server { .. } => ErrorKind::Server,
            Self::Config(_) | Self::Http { .. } | Self::Parse(_) | Self::ChallengeBusy => {
                ErrorKind::Other
            }
        }
    }

    /// Transient failures may succeed if the user re-triggers the action.
    /// Nothing in this crate retries them automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient)
    }

    /// Message suitable for inline display, without the category prefix.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(message)
            | Self::AuthenticationExpired(message)
            | Self::StepUpRequired(message)
            | Self::StepUpInvalid(message)
            | Self::Validation(message)
            | Self::Timeout(message)
            | Self::Network(message)
            | Self::Parse(message) => message.clone(),
            Self::Server { .. } => "Something went wrong on our side. Please try again.".to_string(),
            Self::Http { message, .. } => message.clone(),
            Self::ChallengeBusy => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, ErrorKind};

    #[test]
    fn transient_errors_are_retryable() {
        assert!(ApiError::Timeout("slow".to_string()).is_retryable());
        assert!(ApiError::Network("down".to_string()).is_retryable());
        assert!(
            !ApiError::Server {
                status: 502,
                message: "bad gateway".to_string()
            }
            .is_retryable()
        );
        assert!(!ApiError::StepUpInvalid("wrong code".to_string()).is_retryable());
    }

    #[test]
    fn kind_maps_each_category() {
        assert_eq!(
            ApiError::AuthenticationExpired(String::new()).kind(),
            ErrorKind::AuthenticationExpired
        );
        assert_eq!(
            ApiError::StepUpRequired(String::new()).kind(),
            ErrorKind::StepUpRequired
        );
        assert_eq!(
            ApiError::Validation(String::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(ApiError::ChallengeBusy.kind(), ErrorKind::Other);
    }

    #[test]
    fn server_errors_hide_backend_details() {
        let err = ApiError::Server {
            status: 500,
            message: "stack trace at line 42".to_string(),
        };
        assert!(!err.user_message().contains("stack trace"));
        assert_eq!(err.to_string(), "Server error (500): stack trace at line 42");
    }
}
