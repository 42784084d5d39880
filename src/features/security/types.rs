use serde::Deserialize;

/// Freshly generated backup codes. Shown once; never logged.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCodesResponse {
    pub backup_codes: Vec<String>,
}

impl std::fmt::Debug for BackupCodesResponse {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BackupCodesResponse")
            .field("count", &self.backup_codes.len())
            .finish()
    }
}
