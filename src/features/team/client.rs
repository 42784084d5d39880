use super::types::ChangeRoleRequest;
use crate::{
    api::Gateway,
    error::ApiError,
    features::{ActionReceipt, path_segment},
};

/// Assigns `role_id` to a team member.
///
/// # Errors
/// Returns `ApiError::Validation` for an invalid member or role id, or the
/// gateway's error.
pub async fn change_role(
    gateway: &Gateway,
    member_id: &str,
    role_id: &str,
) -> Result<ActionReceipt, ApiError> {
    let path = format!("/admin/team/{}/role", path_segment("team member", member_id)?);
    let request = ChangeRoleRequest {
        role_id: path_segment("role", role_id)?.to_string(),
    };
    gateway
        .patch_json_optional(&path, Some(&request))
        .await
        .map(Option::unwrap_or_default)
}
