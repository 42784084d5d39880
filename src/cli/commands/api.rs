use crate::config::{
    ApiConfig, DEFAULT_TIMEOUT, ENV_API_BASE_URL, ENV_ENVIRONMENT, ENV_TIMEOUT, Environment,
};
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, builder::ValueParser};
use std::{env, path::PathBuf, time::Duration};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_ENV: &str = "env";
pub const ARG_TOKEN_FILE: &str = "token-file";
pub const ARG_TIMEOUT: &str = "timeout";

pub const ENV_TOKEN_FILE: &str = "STEPUP_TOKEN_FILE";

#[must_use]
pub fn validator_environment() -> ValueParser {
    ValueParser::from(move |value: &str| -> std::result::Result<Environment, String> {
        value.parse::<Environment>().map_err(|err| err.to_string())
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Admin API base URL, example: https://api.example.com/api")
                .env(ENV_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_ENV)
                .long(ARG_ENV)
                .help("Deployment environment: development, staging, production")
                .env(ENV_ENVIRONMENT)
                .default_value("production")
                .global(true)
                .value_parser(validator_environment()),
        )
        .arg(
            Arg::new(ARG_TOKEN_FILE)
                .long(ARG_TOKEN_FILE)
                .help("Where the session is stored (default: ~/.config/stepup/session.json)")
                .env(ENV_TOKEN_FILE)
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds")
                .env(ENV_TIMEOUT)
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub config: ApiConfig,
    pub token_file: PathBuf,
}

impl Options {
    /// # Errors
    /// Returns an error if the API base URL is missing outside development or invalid.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let environment = matches
            .get_one::<Environment>(ARG_ENV)
            .copied()
            .unwrap_or(Environment::Production);
        let timeout = matches
            .get_one::<u64>(ARG_TIMEOUT)
            .copied()
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        let api_url = matches.get_one::<String>(ARG_API_URL);

        let config = ApiConfig::resolve(api_url.map(String::as_str), environment, timeout)
            .with_context(|| format!("invalid {ENV_API_BASE_URL}"))?;

        let token_file = matches
            .get_one::<PathBuf>(ARG_TOKEN_FILE)
            .cloned()
            .unwrap_or_else(default_token_file);

        Ok(Self { config, token_file })
    }
}

fn default_token_file() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || PathBuf::from(".stepup-session.json"),
        |home| {
            PathBuf::from(home)
                .join(".config")
                .join("stepup")
                .join("session.json")
        },
    )
}
