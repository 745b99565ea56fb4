//! Provider API client: session, node listing and per-node configs.

pub mod auth;
pub mod client_config;
pub mod nodes;

pub use auth::{acquire_session, login, AuthError};
pub use client_config::ConfigFetcher;
pub use nodes::{list_nodes, list_share_links, ListError};
