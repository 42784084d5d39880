//! Transport Gateway: every admin API call goes through one [`Gateway`].
//!
//! Flow Overview:
//! 1) Attach `Authorization: Bearer <session>` when signed in, `X-MFA-Token` while
//!    the step-up slot holds an action token, and an `X-Request-Id` ULID.
//! 2) On `401` outside the unauthenticated endpoints, refresh the session once
//!    (single-flight) and replay the request with the new token.
//! 3) Normalize every failure into [`ApiError`].
//!
//! A `401`/`403` whose body carries a step-up error code is a step-up failure, not
//! an expired session, and never starts a refresh.

pub(crate) mod refresh;
pub(crate) mod response;
pub mod routes;

use crate::{
    APP_USER_AGENT,
    config::ApiConfig,
    error::ApiError,
    session::{CredentialStore, Navigator},
    step_up::StepUpSlot,
};
use refresh::{RefreshGate, RefreshResult};
use reqwest::{Client, Method, Response, StatusCode, header::ACCEPT};
use response::{classify, map_request_error, parse_error_body};
use routes::endpoints;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use ulid::Ulid;
use url::Url;

/// Header carrying the step-up action token. Distinct from `Authorization`.
pub const STEP_UP_HEADER: &str = "X-MFA-Token";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

struct GatewayInner {
    client: Client,
    config: ApiConfig,
    credentials: CredentialStore,
    step_up: StepUpSlot,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshGate,
}

#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl Gateway {
    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(
        config: ApiConfig,
        credentials: CredentialStore,
        step_up: StepUpSlot,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            inner: Arc::new(GatewayInner {
                client,
                config,
                credentials,
                step_up,
                navigator,
                refresh: RefreshGate::default(),
            }),
        })
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    #[must_use]
    pub fn step_up_slot(&self) -> &StepUpSlot {
        &self.inner.step_up
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// # Errors
    /// Returns an `ApiError` for transport failures, non-success statuses or an
    /// undecodable body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(Method::GET, path, None).await?;
        decode(&body)
    }

    /// # Errors
    /// Returns an `ApiError` for transport failures, non-success statuses or an
    /// undecodable body.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_value(body)?;
        let response = self.execute(Method::POST, path, Some(&body)).await?;
        decode(&response)
    }

    /// Sends a POST and ignores any response body.
    ///
    /// # Errors
    /// Returns an `ApiError` for transport failures or non-success statuses.
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let body = body.map(to_value).transpose()?;
        self.execute(Method::POST, path, body.as_ref()).await?;
        Ok(())
    }

    /// Sends a PATCH. An empty success body (`204`) yields `None`.
    ///
    /// # Errors
    /// Returns an `ApiError` for transport failures, non-success statuses or an
    /// undecodable body.
    pub async fn patch_json_optional<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ApiError> {
        let body = body.map(to_value).transpose()?;
        let response = self.execute(Method::PATCH, path, body.as_ref()).await?;
        decode_optional(&response)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.inner.config.endpoint(path)?;
        let span = info_span!(
            "api.request",
            http.method = %method,
            url.path = %url.path()
        );

        async {
            let token = self.inner.credentials.access_token();
            let response = self
                .send_once(method.clone(), &url, body, token.as_ref())
                .await?;

            if response.status() != StatusCode::UNAUTHORIZED || routes::skips_refresh(path) {
                return finish(response).await;
            }

            let status = response.status();
            let error = parse_error_body(&read_body(response).await?);
            if error.step_up.is_some() {
                return Err(classify(status, error));
            }

            debug!("session token rejected, refreshing");
            let fresh = self.refresh_session(token.as_ref()).await?;
            // A second 401 is final.
            let response = self.send_once(method, &url, body, Some(&fresh)).await?;
            finish(response).await
        }
        .instrument(span)
        .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        session: Option<&SecretString>,
    ) -> Result<Response, ApiError> {
        let request_id = Ulid::new().to_string();
        let mut request = self
            .inner
            .client
            .request(method, url.clone())
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, &request_id);

        if let Some(session) = session {
            request = request.bearer_auth(session.expose_secret());
        }
        // Read on every send so a replay after refresh still carries it.
        let step_up = self.inner.step_up.token();
        if let Some(action_token) = &step_up {
            request = request.header(STEP_UP_HEADER, action_token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%request_id, step_up = step_up.is_some(), "sending request");
        request.send().await.map_err(|err| map_request_error(&err))
    }

    async fn refresh_session(&self, stale: Option<&SecretString>) -> RefreshResult {
        let credentials = &self.inner.credentials;
        self.inner
            .refresh
            .refresh(stale, || credentials.access_token(), || self.perform_refresh())
            .await
    }

    /// Runs on the refresh leader only.
    async fn perform_refresh(&self) -> RefreshResult {
        match self.request_refresh().await {
            Ok(tokens) => {
                let access_token = SecretString::from(tokens.access_token);
                let refresh_token = tokens.refresh_token.map(SecretString::from);
                if !self
                    .inner
                    .credentials
                    .rotate_tokens(access_token.clone(), refresh_token)
                {
                    return Err(ApiError::AuthenticationExpired(
                        "Session ended during refresh.".to_string(),
                    ));
                }
                info!("session refreshed");
                Ok(access_token)
            }
            Err(err) => {
                warn!("session refresh failed: {err}");
                self.inner.credentials.clear();
                if self.inner.navigator.session_expired() {
                    info!("redirected to login");
                }
                Err(ApiError::AuthenticationExpired(
                    "Your session has expired. Please sign in again.".to_string(),
                ))
            }
        }
    }

    /// Plain request to the refresh endpoint, outside the refresh interceptor.
    async fn request_refresh(&self) -> Result<RefreshResponse, ApiError> {
        let refresh_token = self.inner.credentials.refresh_token().ok_or_else(|| {
            ApiError::AuthenticationExpired("No refresh token available.".to_string())
        })?;
        let url = self.inner.config.endpoint(endpoints::REFRESH)?;
        let span = info_span!("api.refresh", http.method = "POST", url.path = %url.path());

        let response = self
            .inner
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, Ulid::new().to_string())
            .json(&RefreshRequest {
                refresh_token: refresh_token.expose_secret(),
            })
            .send()
            .instrument(span)
            .await
            .map_err(|err| map_request_error(&err))?;

        decode(&finish(response).await?)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Gateway")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("authenticated", &self.inner.credentials.is_authenticated())
            .field("step_up", &self.inner.step_up)
            .finish_non_exhaustive()
    }
}

/// Returns the body of a successful response or the classified error.
async fn finish(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let body = read_body(response).await?;
    debug!(status = status.as_u16(), "response received");
    if status.is_success() {
        Ok(body)
    } else {
        Err(classify(status, parse_error_body(&body)))
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>, ApiError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|err| map_request_error(&err))
}

fn to_value<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|err| ApiError::Parse(format!("Failed to encode request: {err}")))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
}

fn decode_optional<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    decode(body).map(Some)
}
