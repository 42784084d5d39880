//! Protected-operation call sites. Each feature keeps its wire types in
//! `types.rs`, its raw endpoint wrappers in `client.rs`, and wraps the mutations
//! that need a second factor with a [`crate::step_up::MfaHandle`].

pub mod auth;
pub mod kyc;
pub mod merchants;
pub mod security;
pub mod team;

use crate::error::ApiError;
use serde::Deserialize;

/// Acknowledgement returned by admin mutations. The endpoints may answer with
/// `204 No Content` or a partial body, so every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionReceipt {
    pub id: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Validates an identifier before it is spliced into a request path.
pub(crate) fn path_segment<'a>(label: &str, id: &'a str) -> Result<&'a str, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::Validation(format!("A {label} id is required")));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        || id.chars().all(|c| c == '.')
    {
        return Err(ApiError::Validation(format!("Invalid {label} id: {id}")));
    }
    Ok(id)
}

/// Trims a free-text reason and rejects it when empty.
pub(crate) fn required_reason(reason: &str, action: &str) -> Result<String, ApiError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ApiError::Validation(format!(
            "Please provide a reason to {action}"
        )));
    }
    Ok(reason.to_string())
}
