//! The end-to-end run: session, listing, per-node fetch, encode, sink.

use std::io;

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::api::{acquire_session, list_nodes, list_share_links, AuthError, ConfigFetcher, ListError};
use crate::generator::{config_to_link, LinkError};
use crate::models::{ClientConfig, ConfigError, NodeSummary, Protocol, Session};
use crate::output::LinkSink;
use crate::settings::{Credentials, Settings};
use crate::utils::http::{parse_proxy, HttpError, HttpTransport, ReqwestTransport};
use crate::utils::retry::{Sleeper, ThreadSleeper};

const LINK_PREVIEW_LEN: usize = 80;

/// Errors that abort the whole run.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    List(#[from] ListError),

    #[error("the provider returned no nodes")]
    NoNodes,

    #[error("no share link could be produced")]
    NoLinks,

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(HttpError),
}

/// Errors that only skip the node they belong to.
#[derive(Error, Debug)]
enum ItemError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub listed: usize,
    pub emitted: usize,
    pub skipped: usize,
}

fn preview(link: &str) -> String {
    let mut shown: String = link.chars().take(LINK_PREVIEW_LEN).collect();
    if shown.len() < link.len() {
        shown.push_str("...");
    }
    shown
}

fn encode_node(raw: Value, label: &str) -> Result<(Protocol, String), ItemError> {
    let config = ClientConfig::from_value(raw)?;
    let link = config_to_link(&config, label)?;
    Ok((config.protocol, link))
}

/// Runs the pipeline once and writes every produced link to `sink`.
///
/// Per-node failures are logged and skipped. The run fails when the
/// session, the listing or the sink fails, or when nothing was produced.
pub fn harvest<T, S, K>(
    settings: &Settings,
    transport: &T,
    sleeper: &S,
    sink: &mut K,
) -> Result<HarvestReport, HarvestError>
where
    T: HttpTransport + ?Sized,
    S: Sleeper + ?Sized,
    K: LinkSink + ?Sized,
{
    let session = acquire_session(transport, &settings.credentials)?;

    let report = match &settings.credentials {
        Credentials::Password(_) => {
            let nodes = list_nodes(transport, &session, &settings.api_base, &settings.platform)?;
            harvest_client_configs(settings, transport, sleeper, &session, &nodes, sink)?
        }
        Credentials::TokenPair(_) => {
            let links = list_share_links(transport, &session, &settings.api_base)?;
            if links.is_empty() {
                return Err(HarvestError::NoNodes);
            }
            for link in &links {
                sink.push(link)?;
            }
            HarvestReport {
                listed: links.len(),
                emitted: links.len(),
                skipped: 0,
            }
        }
    };
    sink.finish()?;

    if report.emitted == 0 {
        error!("No share link was produced, check the account state or network");
        return Err(HarvestError::NoLinks);
    }
    info!(
        "Done: {} links written, {} of {} nodes skipped",
        report.emitted, report.skipped, report.listed
    );
    Ok(report)
}

/// [`harvest`] over the network with real sleeps, as the binary and the
/// web endpoint run it.
pub fn harvest_live<K: LinkSink + ?Sized>(
    settings: &Settings,
    sink: &mut K,
) -> Result<HarvestReport, HarvestError> {
    let transport =
        ReqwestTransport::new(&parse_proxy(&settings.proxy)).map_err(HarvestError::Client)?;
    harvest(settings, &transport, &ThreadSleeper, sink)
}

fn harvest_client_configs<T, S, K>(
    settings: &Settings,
    transport: &T,
    sleeper: &S,
    session: &Session,
    nodes: &[NodeSummary],
    sink: &mut K,
) -> Result<HarvestReport, HarvestError>
where
    T: HttpTransport + ?Sized,
    S: Sleeper + ?Sized,
    K: LinkSink + ?Sized,
{
    if nodes.is_empty() {
        return Err(HarvestError::NoNodes);
    }

    let fetcher = ConfigFetcher::new(
        transport,
        session,
        &settings.api_base,
        settings.retry,
        sleeper,
    );
    let mut report = HarvestReport {
        listed: nodes.len(),
        ..Default::default()
    };

    for node in nodes {
        let Some(node_id) = node.id() else {
            debug!("Skipping node entry without id");
            report.skipped += 1;
            continue;
        };
        let label = node.label();

        let Some(raw) = fetcher.fetch(node_id) else {
            report.skipped += 1;
            continue;
        };

        match encode_node(raw, &label) {
            Ok((protocol, link)) => {
                sink.push(&link)?;
                report.emitted += 1;
                info!(
                    "Saved {} node {} ({})",
                    protocol.as_str().to_uppercase(),
                    node_id,
                    label
                );
                debug!("  {}", preview(&link));
            }
            Err(ItemError::Config(ConfigError::Unsupported(tag))) => {
                info!("  Skipping unsupported protocol {:?} (node {})", tag, node_id);
                report.skipped += 1;
            }
            Err(e) => {
                warn!("Failed to build link for node {}: {}", node_id, e);
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}
