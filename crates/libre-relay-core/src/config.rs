//! Run configuration.
//!
//! All settings come from environment variables (the binary loads a `.env`
//! file first). Everything is validated up front so that a bad setting never
//! costs a login attempt.

use std::time::Duration;

use reqwest::header::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::auth::{ClientIdentity, Credentials};

pub const ENV_EMAIL: &str = "email";
pub const ENV_PASSWORD: &str = "password";
pub const ENV_CONNECTION_ID: &str = "SGID";
pub const ENV_ACCOUNT_ID: &str = "MGID";
pub const ENV_DESTINATION: &str = "DESTINATION";
pub const ENV_BASE_URL: &str = "LIBRE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "LIBRE_TIMEOUT_SECS";
pub const ENV_CLIENT_VERSION: &str = "LIBRE_VERSION";
pub const ENV_CLIENT_PRODUCT: &str = "LIBRE_PRODUCT";

#[derive(Error, Debug)]
#[error("invalid configuration: {}", .problems.join("; "))]
pub struct ConfigError {
    pub problems: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Patient connection whose graph is fetched
    pub connection_id: String,
    /// Account id, informational only
    pub account_id: Option<String>,
    pub destination: Url,
    pub base_url: Url,
    pub timeout: Duration,
    pub identity: ClientIdentity,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut problems = Vec::new();

        let email = require(&mut problems, ENV_EMAIL, get(ENV_EMAIL));
        // Passwords are taken verbatim, surrounding whitespace included
        let password = require(
            &mut problems,
            ENV_PASSWORD,
            lookup(ENV_PASSWORD).filter(|v| !v.is_empty()),
        );
        let connection_id = require(&mut problems, ENV_CONNECTION_ID, get(ENV_CONNECTION_ID));
        let destination = require(&mut problems, ENV_DESTINATION, get(ENV_DESTINATION));

        let destination = destination.and_then(|raw| match parse_url(&raw) {
            Ok(url) => Some(url),
            Err(reason) => {
                problems.push(format!("{} {}", ENV_DESTINATION, reason));
                None
            }
        });

        let base_url = match parse_url(&get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string())) {
            Ok(url) => Some(with_trailing_slash(url)),
            Err(reason) => {
                problems.push(format!("{} {}", ENV_BASE_URL, reason));
                None
            }
        };

        let timeout = match get(ENV_TIMEOUT_SECS) {
            None => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    problems.push(format!(
                        "{} must be a positive number of seconds, got {:?}",
                        ENV_TIMEOUT_SECS, raw
                    ));
                    None
                }
            },
        };

        let defaults = ClientIdentity::default();
        let identity = ClientIdentity {
            version: header_setting(&mut problems, ENV_CLIENT_VERSION, get(ENV_CLIENT_VERSION))
                .unwrap_or(defaults.version),
            product: header_setting(&mut problems, ENV_CLIENT_PRODUCT, get(ENV_CLIENT_PRODUCT))
                .unwrap_or(defaults.product),
        };

        match (email, password, connection_id, destination, base_url, timeout) {
            (Some(email), Some(password), Some(connection_id), Some(destination), Some(base_url), Some(timeout))
                if problems.is_empty() =>
            {
                Ok(Self {
                    credentials: Credentials::new(email, password),
                    connection_id,
                    account_id: get(ENV_ACCOUNT_ID),
                    destination,
                    base_url,
                    timeout,
                    identity,
                })
            }
            _ => Err(ConfigError { problems }),
        }
    }
}

fn require(problems: &mut Vec<String>, key: &str, value: Option<String>) -> Option<String> {
    if value.is_none() {
        problems.push(format!("{} is not set", key));
    }
    value
}

/// Values sent verbatim as request headers must be valid header text
fn header_setting(problems: &mut Vec<String>, key: &str, value: Option<String>) -> Option<String> {
    let value = value?;
    if HeaderValue::from_str(&value).is_err() {
        problems.push(format!("{} contains characters not allowed in a header", key));
        return None;
    }
    Some(value)
}

fn parse_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("is not a valid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("must be http or https, got {}", other)),
    }
}

/// `Url::join` replaces the last segment unless the base ends with a slash
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
