//! Request and response types for admin auth calls. These payloads carry
//! passwords, one-time codes and tokens, so none of them derive `Debug` with
//! secret fields exposed and none of them may be logged.

use crate::session::Principal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyLoginMfaRequest<'a> {
    pub temp_token: &'a str,
    pub code: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SetPasswordRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct VerifyActionRequest<'a> {
    pub code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub action_token: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub expires_in: u64,
}

/// Either an established session or a login-time MFA challenge.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionResponse {
    #[serde(default)]
    pub requires_mfa: bool,
    #[serde(default)]
    pub temp_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub admin: Option<AdminProfile>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<RoleField>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// The role arrives either as a plain name or as a role object.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RoleField {
    Name(String),
    Object { name: String },
}

impl AdminProfile {
    pub(crate) fn into_parts(self) -> (Principal, Vec<String>) {
        let role = self.role.map(|role| match role {
            RoleField::Name(name) | RoleField::Object { name } => name,
        });
        (
            Principal {
                id: self.id,
                email: self.email,
                name: self.name,
                role,
            },
            self.permissions,
        )
    }
}

/// Result of a password login.
#[derive(Debug)]
pub enum LoginOutcome {
    SignedIn(Principal),
    MfaRequired(PendingLogin),
}

/// Login awaiting its second factor. Holds the short-lived temp token.
pub struct PendingLogin {
    pub(crate) temp_token: SecretString,
}

impl std::fmt::Debug for PendingLogin {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("PendingLogin")
    }
}
