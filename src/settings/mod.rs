//! Run configuration collected once from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::api::{DEFAULT_CLIENT_ID, DEFAULT_DEVICE_TYPE, DEFAULT_PLATFORM};
use crate::utils::retry::{RetryPolicy, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES};

pub const ENV_PREFIX: &str = "NODELINKS_";

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("missing required environment variable NODELINKS_{0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for NODELINKS_{name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordCredentials {
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPairCredentials {
    pub token: String,
    pub auth_token: String,
    pub device_id: String,
    pub device_type: String,
}

/// How the session is obtained, which also selects the provider API shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth2 password grant, per-node `clientConfig` fetching
    Password(PasswordCredentials),
    /// Pre-issued header tokens, share-link catalog listing
    TokenPair(TokenPairCredentials),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub platform: String,
    pub credentials: Credentials,
    pub retry: RetryPolicy,
    pub output: Option<PathBuf>,
    pub proxy: String,
    pub listen_address: String,
    pub listen_port: u16,
}

/// Backoff bases must be finite and positive.
pub fn is_valid_backoff_factor(factor: f64) -> bool {
    factor.is_finite() && factor > 0.0
}

struct Lookup<F> {
    get: F,
}

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.get)(&format!("{}{}", ENV_PREFIX, name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, SettingsError> {
        self.optional(name).ok_or(SettingsError::Missing(name))
    }

    fn or(&self, name: &'static str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, SettingsError> {
        match self.optional(name) {
            Some(value) => value
                .parse()
                .map_err(|_| SettingsError::Invalid { name, value }),
            None => Ok(default),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Validation happens here, so a
    /// missing credential is reported before any request is made.
    pub fn from_lookup<F>(get: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup { get };

        let provider = env.or("PROVIDER", "client-config");
        let credentials = match provider.as_str() {
            "client-config" => Credentials::Password(PasswordCredentials {
                auth_url: env.required("AUTH_URL")?,
                client_id: env.or("CLIENT_ID", DEFAULT_CLIENT_ID),
                client_secret: env.required("CLIENT_SECRET")?,
                username: env.required("USERNAME")?,
                password: env.required("PASSWORD")?,
            }),
            "share-link" => Credentials::TokenPair(TokenPairCredentials {
                token: env.required("TOKEN")?,
                auth_token: env.required("AUTH_TOKEN")?,
                device_id: env.required("DEVICE_ID")?,
                device_type: env.or("DEVICE_TYPE", DEFAULT_DEVICE_TYPE),
            }),
            _ => {
                return Err(SettingsError::Invalid {
                    name: "PROVIDER",
                    value: provider,
                })
            }
        };

        let backoff_factor: f64 = env.parsed("BACKOFF_FACTOR", DEFAULT_BACKOFF_FACTOR)?;
        if !is_valid_backoff_factor(backoff_factor) {
            return Err(SettingsError::Invalid {
                name: "BACKOFF_FACTOR",
                value: backoff_factor.to_string(),
            });
        }

        Ok(Settings {
            api_base: env.required("API_BASE")?.trim_end_matches('/').to_string(),
            platform: env.or("PLATFORM", DEFAULT_PLATFORM),
            credentials,
            retry: RetryPolicy::new(
                env.parsed("MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
                backoff_factor,
            ),
            output: env.optional("OUTPUT").map(PathBuf::from),
            proxy: env.or("PROXY", ""),
            listen_address: env.or("LISTEN_ADDRESS", "127.0.0.1"),
            listen_port: env.parsed("LISTEN_PORT", 8080)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        if self.listen_address.contains(':') {
            self.listen_address.clone()
        } else {
            format!("{}:{}", self.listen_address, self.listen_port)
        }
    }
}
