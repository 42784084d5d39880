//! Translation of HTTP outcomes into [`ApiError`]. Error bodies are trimmed and
//! truncated before they reach the UI.

use crate::error::ApiError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

/// Error codes the API uses when an action token is missing.
const STEP_UP_REQUIRED_CODES: &[&str] = &["MFA_REQUIRED", "STEP_UP_REQUIRED", "ACTION_MFA_REQUIRED"];
/// Error codes for a wrong code or an expired/consumed action token.
const STEP_UP_INVALID_CODES: &[&str] = &[
    "MFA_INVALID",
    "INVALID_MFA_CODE",
    "INVALID_MFA_TOKEN",
    "MFA_TOKEN_EXPIRED",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepUpSignal {
    Required,
    Invalid,
}

#[derive(Debug)]
pub(crate) struct ErrorBody {
    pub message: String,
    pub step_up: Option<StepUpSignal>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    message: Option<MessageField>,
    error: Option<String>,
    code: Option<String>,
    error_code: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageField {
    One(String),
    Many(Vec<String>),
}

pub(crate) fn parse_error_body(body: &[u8]) -> ErrorBody {
    let (envelope, is_json) = match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope, true),
        Err(_) => (ErrorEnvelope::default(), false),
    };

    let message = match envelope.message {
        Some(MessageField::One(message)) if !message.trim().is_empty() => message,
        Some(MessageField::Many(messages)) if !messages.is_empty() => messages.join(", "),
        _ => match envelope.error.clone() {
            Some(error) => error,
            None if is_json => String::new(),
            None => String::from_utf8_lossy(body).into_owned(),
        },
    };

    let step_up = envelope
        .code
        .as_deref()
        .or(envelope.error_code.as_deref())
        .and_then(step_up_signal);

    ErrorBody {
        message: sanitize_message(&message),
        step_up,
    }
}

fn step_up_signal(code: &str) -> Option<StepUpSignal> {
    let code = code.trim().to_uppercase();
    if STEP_UP_REQUIRED_CODES.contains(&code.as_str()) {
        Some(StepUpSignal::Required)
    } else if STEP_UP_INVALID_CODES.contains(&code.as_str()) {
        Some(StepUpSignal::Invalid)
    } else {
        None
    }
}

/// Maps a non-success response into the error taxonomy.
pub(crate) fn classify(status: StatusCode, body: ErrorBody) -> ApiError {
    let ErrorBody { message, step_up } = body;

    match step_up {
        Some(StepUpSignal::Required) => return ApiError::StepUpRequired(message),
        Some(StepUpSignal::Invalid) => return ApiError::StepUpInvalid(message),
        None => {}
    }

    match status {
        StatusCode::UNAUTHORIZED => ApiError::AuthenticationExpired(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        StatusCode::REQUEST_TIMEOUT => {
            ApiError::Timeout("Request timed out. Please try again.".to_string())
        }
        status if status.is_server_error() => ApiError::Server {
            status: status.as_u16(),
            message,
        },
        status => ApiError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

/// Maps transport errors into user-facing `ApiError` variants with timeout detection.
pub(crate) fn map_request_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Trims and truncates a message for user-facing display.
fn sanitize_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
