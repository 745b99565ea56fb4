use std::fmt;

use log::{info, warn};
use serde_json::{json, Value};

use crate::constants::api::{CLIENT_CONFIG_TIMEOUT_SECS, CONFIG_USER_AGENT};
use crate::models::{NodeId, Session};
use crate::utils::http::{ApiRequest, HttpError, HttpTransport};
use crate::utils::retry::{RetryPolicy, Sleeper};

enum FetchFailure {
    Status(u16),
    Transport(HttpError),
    Decode(HttpError),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(status) => write!(f, "HTTP {}", status),
            FetchFailure::Transport(e) => write!(f, "{}", e),
            FetchFailure::Decode(e) => write!(f, "undecodable response body ({})", e),
        }
    }
}

/// Fetches per-node `clientConfig` payloads under a retry policy.
pub struct ConfigFetcher<'a, T: ?Sized, S: ?Sized> {
    transport: &'a T,
    session: &'a Session,
    api_base: &'a str,
    policy: RetryPolicy,
    sleeper: &'a S,
}

impl<'a, T, S> ConfigFetcher<'a, T, S>
where
    T: HttpTransport + ?Sized,
    S: Sleeper + ?Sized,
{
    pub fn new(
        transport: &'a T,
        session: &'a Session,
        api_base: &'a str,
        policy: RetryPolicy,
        sleeper: &'a S,
    ) -> Self {
        ConfigFetcher {
            transport,
            session,
            api_base,
            policy,
            sleeper,
        }
    }

    fn attempt(&self, request: &ApiRequest) -> Result<Value, FetchFailure> {
        let response = self
            .transport
            .post(request)
            .map_err(FetchFailure::Transport)?;
        if !response.is_success() {
            return Err(FetchFailure::Status(response.status));
        }
        response.json().map_err(FetchFailure::Decode)
    }

    /// Returns the raw config, or `None` once every attempt has failed.
    pub fn fetch(&self, node_id: &NodeId) -> Option<Value> {
        let request = ApiRequest::json(
            format!("{}/clientConfig", self.api_base),
            json!({ "nodeId": node_id }),
        )
        .header("User-Agent", CONFIG_USER_AGENT)
        .header("Accept", "application/json")
        .header("accept-charset", "UTF-8")
        .headers(self.session.auth_headers())
        .timeout(CLIENT_CONFIG_TIMEOUT_SECS);

        let result = self.policy.run(self.sleeper, |attempt| {
            self.attempt(&request).inspect_err(|failure| {
                warn!(
                    "  node {} {} (attempt {}/{})",
                    node_id, failure, attempt.number, attempt.total
                );
            })
        });

        match result {
            Ok(config) => {
                info!("  node {} config fetched", node_id);
                Some(config)
            }
            Err(exhausted) => {
                warn!(
                    "  node {} still failing after {} attempts ({}), skipping",
                    node_id, exhausted.attempts, exhausted.last_error
                );
                None
            }
        }
    }
}
