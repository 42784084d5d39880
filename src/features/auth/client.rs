//! Client wrappers for the admin auth endpoints. Passwords, one-time codes and
//! tokens pass through here and must never be logged.

use super::types::{
    ForgotPasswordRequest, LoginOutcome, LoginRequest, PendingLogin, SessionResponse,
    SetPasswordRequest, VerifyActionRequest, VerifyActionResponse, VerifyLoginMfaRequest,
};
use crate::{
    api::{Gateway, routes::endpoints},
    error::ApiError,
    session::{Principal, SessionCredential},
    step_up::{ActionVerifier, CODE_LENGTH, StepUpArtifact, sanitize_code},
};
use secrecy::{ExposeSecret, SecretString};
use std::{future::Future, time::Duration};
use tracing::{info, warn};

/// Password login. Establishes the session unless the account requires a
/// login-time second factor.
///
/// # Errors
/// Returns `ApiError::Validation` for missing credentials before any request is
/// sent, or the gateway's error.
pub async fn login(gateway: &Gateway, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
    let email = validate_email(email)?;
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    let response: SessionResponse = gateway
        .post_json(endpoints::LOGIN, &LoginRequest { email, password })
        .await?;

    if response.requires_mfa {
        let temp_token = response.temp_token.ok_or_else(|| {
            ApiError::Parse("Login requires MFA but no temporary token was returned".to_string())
        })?;
        info!("login requires a second factor");
        return Ok(LoginOutcome::MfaRequired(PendingLogin {
            temp_token: SecretString::from(temp_token),
        }));
    }

    establish_session(gateway, response).map(LoginOutcome::SignedIn)
}

/// Completes a login that required a second factor.
///
/// # Errors
/// Returns `ApiError::Validation` for a malformed code, or the gateway's error.
pub async fn verify_login_mfa(
    gateway: &Gateway,
    pending: &PendingLogin,
    code: &str,
) -> Result<Principal, ApiError> {
    let code = complete_code(code)?;
    let response: SessionResponse = gateway
        .post_json(
            endpoints::VERIFY_LOGIN_MFA,
            &VerifyLoginMfaRequest {
                temp_token: pending.temp_token.expose_secret(),
                code: &code,
            },
        )
        .await?;
    establish_session(gateway, response)
}

/// Ends the session. Local credentials and any action token are cleared even if
/// the server call fails.
///
/// # Errors
/// Never fails after clearing local state; the server error is only logged.
pub async fn logout(gateway: &Gateway) -> Result<(), ApiError> {
    if gateway.credentials().is_authenticated()
        && let Err(err) = gateway.post_empty::<()>(endpoints::LOGOUT, None).await
    {
        warn!("logout request failed: {err}");
    }
    gateway.credentials().clear();
    gateway.step_up_slot().clear();
    info!("signed out");
    Ok(())
}

/// Requests a password reset email. The response never reveals whether the
/// account exists.
///
/// # Errors
/// Returns `ApiError::Validation` for a malformed email, or the gateway's error.
pub async fn forgot_password(gateway: &Gateway, email: &str) -> Result<(), ApiError> {
    let email = validate_email(email)?;
    gateway
        .post_empty(endpoints::FORGOT_PASSWORD, Some(&ForgotPasswordRequest { email }))
        .await
}

/// Sets a new password from an invitation or reset token.
///
/// # Errors
/// Returns `ApiError::Validation` for a missing token or password, or the gateway's error.
pub async fn set_password(gateway: &Gateway, token: &str, password: &str) -> Result<(), ApiError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Validation("Reset token is required".to_string()));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }
    gateway
        .post_empty(endpoints::SET_PASSWORD, Some(&SetPasswordRequest { token, password }))
        .await
}

/// Exchanges a 6-digit code for a short-lived action token.
///
/// # Errors
/// Returns `ApiError::Validation` for a code that is not six digits (no request
/// is sent), `ApiError::StepUpInvalid` when the server rejects the code, or the
/// gateway's transport error.
pub async fn verify_action_mfa(
    gateway: &Gateway,
    code: &str,
    action: Option<&str>,
) -> Result<StepUpArtifact, ApiError> {
    let code = complete_code(code)?;
    let response: VerifyActionResponse = gateway
        .post_json(
            endpoints::VERIFY_ACTION_MFA,
            &VerifyActionRequest { code: &code, action },
        )
        .await
        .map_err(|err| match err {
            // The verify endpoint is never replayed, so a 401 here is a rejected code.
            ApiError::Validation(message) | ApiError::AuthenticationExpired(message) => {
                ApiError::StepUpInvalid(message)
            }
            ApiError::Http { status, message } if (400..500).contains(&status) => {
                ApiError::StepUpInvalid(message)
            }
            other => other,
        })?;

    match response.action_token {
        Some(token) if response.success && !token.is_empty() => Ok(StepUpArtifact::new(
            SecretString::from(token),
            Duration::from_secs(response.expires_in),
        )),
        _ => Err(ApiError::StepUpInvalid("Invalid verification code".to_string())),
    }
}

impl ActionVerifier for Gateway {
    fn verify_action(
        &self,
        code: &str,
        action: Option<&str>,
    ) -> impl Future<Output = Result<StepUpArtifact, ApiError>> + Send {
        let gateway = self.clone();
        let code = code.to_string();
        let action = action.map(str::to_string);
        async move { verify_action_mfa(&gateway, &code, action.as_deref()).await }
    }
}

fn establish_session(gateway: &Gateway, response: SessionResponse) -> Result<Principal, ApiError> {
    let access_token = response
        .access_token
        .ok_or_else(|| ApiError::Parse("Login response is missing the access token".to_string()))?;
    let admin = response
        .admin
        .ok_or_else(|| ApiError::Parse("Login response is missing the admin profile".to_string()))?;

    let (principal, permissions) = admin.into_parts();
    gateway.credentials().replace(SessionCredential::new(
        principal.clone(),
        permissions,
        SecretString::from(access_token),
        response.refresh_token.map(SecretString::from),
    ));
    info!(admin_id = %principal.id, "signed in");
    Ok(principal)
}

fn validate_email(email: &str) -> Result<&str, ApiError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    Ok(email)
}

fn complete_code(code: &str) -> Result<String, ApiError> {
    let code = sanitize_code(code);
    if code.len() != CODE_LENGTH {
        return Err(ApiError::Validation(format!(
            "Please enter a {CODE_LENGTH}-digit code"
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ApiConfig, Environment},
        session::{CredentialStore, RouteTracker},
        step_up::StepUpSlot,
    };
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn can_bind_localhost() -> bool {
        std::net::TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn gateway(base_url: &str) -> Result<Gateway, ApiError> {
        let config = ApiConfig::resolve(
            Some(base_url),
            Environment::Production,
            Duration::from_secs(5),
        )?;
        Gateway::new(
            config,
            CredentialStore::in_memory(),
            StepUpSlot::default(),
            Arc::new(RouteTracker::default()),
        )
    }

    #[tokio::test]
    async fn login_validates_before_sending() -> Result<(), ApiError> {
        let gateway = gateway("http://127.0.0.1:9")?;
        assert!(matches!(
            login(&gateway, "not-an-email", "pw").await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            login(&gateway, "ops@example.com", "").await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            verify_action_mfa(&gateway, "12", None).await,
            Err(ApiError::Validation(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn login_with_mfa_establishes_session_after_code() -> Result<(), ApiError> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoints::LOGIN))
            .and(body_json(json!({"email": "ops@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "requiresMfa": true,
                "tempToken": "temp-1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(endpoints::VERIFY_LOGIN_MFA))
            .and(body_json(json!({"tempToken": "temp-1", "code": "654321"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "session-1",
                "refreshToken": "refresh-1",
                "admin": {"id": "a1", "email": "ops@example.com", "role": "admin", "permissions": ["kyc:approve"]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server.uri())?;
        let LoginOutcome::MfaRequired(pending) = login(&gateway, "ops@example.com", "pw").await? else {
            panic!("expected an MFA challenge");
        };
        assert!(!gateway.credentials().is_authenticated());

        let principal = verify_login_mfa(&gateway, &pending, "654 321").await?;
        assert_eq!(principal.id, "a1");
        assert!(gateway.credentials().has_permission("kyc:approve"));
        assert_eq!(
            gateway
                .credentials()
                .refresh_token()
                .map(|token| token.expose_secret().to_string()),
            Some("refresh-1".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn verify_action_returns_artifact() -> Result<(), ApiError> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoints::VERIFY_ACTION_MFA))
            .and(body_json(json!({"code": "123456", "action": "Approve KYC"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "actionToken": "tok_abc",
                "expiresIn": 300
            })))
            .mount(&server)
            .await;

        let gateway = gateway(&server.uri())?;
        let artifact = gateway.verify_action("123456", Some("Approve KYC")).await?;
        assert_eq!(artifact.token().expose_secret(), "tok_abc");
        assert_eq!(artifact.expires_in(), Duration::from_secs(300));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_code_is_step_up_invalid() -> Result<(), ApiError> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoints::VERIFY_ACTION_MFA))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid MFA code"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server.uri())?;
        let result = verify_action_mfa(&gateway, "000000", None).await;
        assert!(matches!(result, Err(ApiError::StepUpInvalid(message)) if message == "Invalid MFA code"));
        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_code_is_not_replayed_or_refreshed() -> Result<(), ApiError> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoints::VERIFY_ACTION_MFA))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid MFA code"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(endpoints::REFRESH))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;

        let config = ApiConfig::resolve(
            Some(&server.uri()),
            Environment::Production,
            Duration::from_secs(5),
        )?;
        let navigator = Arc::new(RouteTracker::default());
        let gateway = Gateway::new(
            config,
            CredentialStore::in_memory(),
            StepUpSlot::default(),
            navigator.clone(),
        )?;
        gateway.credentials().replace(SessionCredential::new(
            Principal {
                id: "a1".to_string(),
                email: "ops@example.com".to_string(),
                name: None,
                role: None,
            },
            Vec::new(),
            SecretString::from("session-1"),
            Some(SecretString::from("refresh-1")),
        ));

        let result = verify_action_mfa(&gateway, "000000", Some("Approve KYC")).await;
        assert!(matches!(result, Err(ApiError::StepUpInvalid(message)) if message == "Invalid MFA code"));
        assert!(gateway.credentials().is_authenticated());
        assert_eq!(navigator.redirects(), 0);

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unsuccessful_body_is_step_up_invalid() -> Result<(), ApiError> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoints::VERIFY_ACTION_MFA))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let gateway = gateway(&server.uri())?;
        assert!(matches!(
            verify_action_mfa(&gateway, "111111", None).await,
            Err(ApiError::StepUpInvalid(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_local_state_even_on_failure() -> Result<(), ApiError> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoints::LOGOUT))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server.uri())?;
        gateway.credentials().replace(SessionCredential::new(
            Principal {
                id: "a1".to_string(),
                email: "ops@example.com".to_string(),
                name: None,
                role: None,
            },
            Vec::new(),
            SecretString::from("session-1"),
            None,
        ));

        logout(&gateway).await?;
        assert!(!gateway.credentials().is_authenticated());
        assert!(gateway.step_up_slot().is_empty());
        Ok(())
    }
}
