//! API host configuration. The base URL is the only required setting; it may be
//! omitted in development (where a local default applies) but a missing value in
//! any other environment is a startup error rather than a silent fallback.
//! Configuration values are public; do not store secrets here.

use crate::error::ApiError;
use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;

pub const ENV_API_BASE_URL: &str = "STEPUP_API_BASE_URL";
pub const ENV_ENVIRONMENT: &str = "STEPUP_ENV";
pub const ENV_TIMEOUT: &str = "STEPUP_TIMEOUT";

/// Base URL used when running against a local API in development.
pub const DEFAULT_DEV_BASE_URL: &str = "http://localhost:3000/api";
/// Default request timeout applied to every gateway call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ApiError::Config(format!("unknown environment: {other}"))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        };
        formatter.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub environment: Environment,
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Resolves the configuration from optional raw values.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the base URL is missing outside development,
    /// cannot be parsed, has no host, or uses a scheme other than http/https.
    pub fn resolve(
        base_url: Option<&str>,
        environment: Environment,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = match base_url.and_then(normalize_value) {
            Some(value) => value,
            None if environment == Environment::Development => DEFAULT_DEV_BASE_URL.to_string(),
            None => {
                return Err(ApiError::Config(format!(
                    "API base URL is not configured ({ENV_API_BASE_URL}) for the {environment} environment"
                )));
            }
        };

        let base_url = parse_base_url(&base_url)?;

        Ok(Self {
            base_url,
            environment,
            request_timeout,
        })
    }

    /// Reads `STEPUP_API_BASE_URL`, `STEPUP_ENV` and `STEPUP_TIMEOUT` (seconds).
    /// The environment defaults to production so a missing URL is never tolerated
    /// by accident.
    ///
    /// # Errors
    /// Returns `ApiError::Config` when a value is present but invalid, or when the
    /// base URL is missing outside development.
    pub fn from_env() -> Result<Self, ApiError> {
        let environment = match env::var(ENV_ENVIRONMENT).ok().as_deref().and_then(normalize_value) {
            Some(value) => value.parse()?,
            None => Environment::Production,
        };

        let request_timeout = match env::var(ENV_TIMEOUT).ok().as_deref().and_then(normalize_value) {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ApiError::Config(format!("invalid {ENV_TIMEOUT}: {value}")))?,
            None => DEFAULT_TIMEOUT,
        };

        let base_url = env::var(ENV_API_BASE_URL).ok();
        Self::resolve(base_url.as_deref(), environment, request_timeout)
    }

    /// Builds an absolute endpoint URL from the configured base and `path`.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the joined URL is not valid.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim().trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|err| ApiError::Config(format!("invalid endpoint {path}: {err}")))
    }
}

fn parse_base_url(value: &str) -> Result<Url, ApiError> {
    let url = Url::parse(value)
        .map_err(|err| ApiError::Config(format!("invalid API base URL {value}: {err}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ApiError::Config(format!(
                "invalid API base URL: unsupported scheme {scheme}"
            )));
        }
    }

    if url.host().is_none() {
        return Err(ApiError::Config(
            "invalid API base URL: no host specified".to_string(),
        ));
    }

    Ok(url)
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
