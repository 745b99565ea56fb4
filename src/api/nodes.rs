use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::constants::api::{
    BODY_SNIPPET_LEN, CATALOG_CODE_OK, CATALOG_USER_AGENT, CONFIG_USER_AGENT, LIST_TIMEOUT_SECS,
};
use crate::models::{NodeSummary, Session};
use crate::utils::http::{ApiRequest, HttpError, HttpResponse, HttpTransport};

#[derive(Error, Debug)]
pub enum ListError {
    #[error("node list request failed: {0}")]
    Transport(#[from] HttpError),

    #[error("node list returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("node list response is malformed: {0}")]
    Malformed(String),

    #[error("provider reported failure: {message}")]
    Business { message: String },
}

fn check_status(response: &HttpResponse) -> Result<(), ListError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ListError::Status {
            status: response.status,
            body: response.snippet(BODY_SNIPPET_LEN),
        })
    }
}

/// Fetches the node catalog of a `clientConfig` provider.
///
/// Entries that cannot be decoded are logged and dropped; the order of the
/// remaining entries is kept.
pub fn list_nodes<T: HttpTransport + ?Sized>(
    transport: &T,
    session: &Session,
    api_base: &str,
    platform: &str,
) -> Result<Vec<NodeSummary>, ListError> {
    let request = ApiRequest::json(
        format!("{}/nodeList?platform={}", api_base, platform),
        json!({}),
    )
    .header("User-Agent", CONFIG_USER_AGENT)
    .header("Accept", "application/json")
    .header("accept-charset", "UTF-8")
    .headers(session.auth_headers())
    .timeout(LIST_TIMEOUT_SECS);

    let response = transport.post(&request)?;
    check_status(&response)?;

    let body: Value = response
        .json()
        .map_err(|e| ListError::Malformed(e.to_string()))?;
    let entries = match body {
        Value::Array(entries) => entries,
        _ => return Err(ListError::Malformed("expected a JSON array".to_string())),
    };

    let nodes: Vec<NodeSummary> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(node) => Some(node),
            Err(e) => {
                warn!("Skipping undecodable node entry: {}", e);
                None
            }
        })
        .collect();
    info!("Node list contains {} nodes", nodes.len());
    Ok(nodes)
}

#[derive(Deserialize)]
struct CatalogNode {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct CatalogGroup {
    #[serde(default)]
    node: Option<Vec<CatalogNode>>,
}

#[derive(Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Vec<CatalogGroup>>,
}

/// Fetches a share-link catalog (`data[].node[].url`) and returns the
/// trimmed, non-empty links in catalog order.
pub fn list_share_links<T: HttpTransport + ?Sized>(
    transport: &T,
    session: &Session,
    api_base: &str,
) -> Result<Vec<String>, ListError> {
    let request = ApiRequest::json(
        format!("{}/nodeListV2", api_base),
        json!({
            "protocol": "all",
            "include_ss": "1",
            "include_shadowsocks": "1",
            "include_trojan": "1"
        }),
    )
    .header("User-Agent", CATALOG_USER_AGENT)
    .headers(session.auth_headers())
    .timeout(LIST_TIMEOUT_SECS);

    let response = transport.post(&request)?;
    check_status(&response)?;

    let catalog: CatalogResponse = response
        .json()
        .map_err(|e| ListError::Malformed(e.to_string()))?;
    if catalog.code != Some(CATALOG_CODE_OK) {
        return Err(ListError::Business {
            message: catalog
                .message
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    let links: Vec<String> = catalog
        .data
        .unwrap_or_default()
        .into_iter()
        .flat_map(|group| group.node.unwrap_or_default())
        .filter_map(|node| node.url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    info!("Catalog contains {} links", links.len());
    Ok(links)
}
