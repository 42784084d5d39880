//! Raw KYC review endpoints. Callers wrap these with a step-up handle; the
//! gateway attaches the action token.

use super::types::RejectKycRequest;
use crate::{
    api::Gateway,
    error::ApiError,
    features::{ActionReceipt, path_segment, required_reason},
};

/// # Errors
/// Returns `ApiError::Validation` for an invalid id, or the gateway's error.
pub async fn approve(gateway: &Gateway, user_id: &str) -> Result<ActionReceipt, ApiError> {
    let path = format!("/admin/kyc/{}/approve", path_segment("user", user_id)?);
    gateway
        .patch_json_optional::<(), ActionReceipt>(&path, None)
        .await
        .map(Option::unwrap_or_default)
}

/// # Errors
/// Returns `ApiError::Validation` for an invalid id or a blank reason, or the
/// gateway's error.
pub async fn reject(gateway: &Gateway, user_id: &str, reason: &str) -> Result<ActionReceipt, ApiError> {
    let path = format!("/admin/kyc/{}/reject", path_segment("user", user_id)?);
    let request = RejectKycRequest {
        reason: required_reason(reason, "reject this KYC submission")?,
    };
    gateway
        .patch_json_optional(&path, Some(&request))
        .await
        .map(Option::unwrap_or_default)
}
