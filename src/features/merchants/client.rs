//! Raw merchant moderation endpoints.

use super::types::{MerchantDecision, MerchantReasonRequest};
use crate::{
    api::Gateway,
    error::ApiError,
    features::{ActionReceipt, path_segment, required_reason},
};

/// Sends one moderation decision. Reject and suspend carry a reason.
///
/// # Errors
/// Returns `ApiError::Validation` for an invalid id or a missing reason, or the
/// gateway's error.
pub async fn moderate(
    gateway: &Gateway,
    merchant_id: &str,
    decision: MerchantDecision,
    reason: Option<&str>,
) -> Result<ActionReceipt, ApiError> {
    let path = format!(
        "/admin/merchants/{}/{}",
        path_segment("merchant", merchant_id)?,
        decision.segment()
    );
    let request = match (decision.requires_reason(), reason) {
        (true, reason) => Some(MerchantReasonRequest {
            reason: required_reason(reason.unwrap_or_default(), decision.segment())?,
        }),
        (false, _) => None,
    };
    gateway
        .patch_json_optional(&path, request.as_ref())
        .await
        .map(Option::unwrap_or_default)
}
