use super::types::BackupCodesResponse;
use crate::{
    api::{Gateway, routes::endpoints},
    error::ApiError,
};

/// Invalidates the current backup codes and returns a new set.
///
/// # Errors
/// Returns the gateway's error, or `ApiError::Parse` if no codes came back.
pub async fn regenerate_backup_codes(gateway: &Gateway) -> Result<Vec<String>, ApiError> {
    let response: BackupCodesResponse = gateway
        .post_json(endpoints::REGENERATE_BACKUP_CODES, &serde_json::json!({}))
        .await?;
    if response.backup_codes.is_empty() {
        return Err(ApiError::Parse("No backup codes were returned".to_string()));
    }
    Ok(response.backup_codes)
}
