use log::{error, info};
use serde::Deserialize;
use thiserror::Error;

use crate::constants::api::{BODY_SNIPPET_LEN, CONFIG_USER_AGENT, LOGIN_TIMEOUT_SECS};
use crate::models::Session;
use crate::settings::{Credentials, PasswordCredentials};
use crate::utils::http::{ApiRequest, HttpError, HttpTransport};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("login rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("login response has no access_token")]
    MissingToken,

    #[error("login request failed: {0}")]
    Transport(#[from] HttpError),
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth2 password grant against the identity endpoint. Not retried.
pub fn login<T: HttpTransport + ?Sized>(
    transport: &T,
    credentials: &PasswordCredentials,
) -> Result<Session, AuthError> {
    info!("Logging in as {}", credentials.username);

    let request = ApiRequest::form(
        credentials.auth_url.clone(),
        vec![
            ("client_id".to_string(), credentials.client_id.clone()),
            ("client_secret".to_string(), credentials.client_secret.clone()),
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), credentials.username.clone()),
            ("password".to_string(), credentials.password.clone()),
        ],
    )
    .header("User-Agent", CONFIG_USER_AGENT)
    .header("Accept", "application/json")
    .header("accept-charset", "UTF-8")
    .timeout(LOGIN_TIMEOUT_SECS);

    let response = transport.post(&request)?;
    if !response.is_success() {
        error!("Login failed with HTTP {}", response.status);
        return Err(AuthError::Rejected {
            status: response.status,
            body: response.snippet(BODY_SNIPPET_LEN),
        });
    }

    let token: TokenResponse = response.json()?;
    let access_token = token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    info!(
        "Login succeeded, token valid for about {} minutes",
        token.expires_in.unwrap_or(0) / 60
    );
    Ok(Session::bearer(access_token, token.expires_in))
}

/// Builds the session for the configured provider.
pub fn acquire_session<T: HttpTransport + ?Sized>(
    transport: &T,
    credentials: &Credentials,
) -> Result<Session, AuthError> {
    match credentials {
        Credentials::Password(creds) => login(transport, creds),
        Credentials::TokenPair(pair) => Ok(Session::from_token_pair(
            pair.token.clone(),
            pair.auth_token.clone(),
            pair.device_id.clone(),
            pair.device_type.clone(),
        )),
    }
}
