use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct RejectKycRequest {
    pub reason: String,
}
