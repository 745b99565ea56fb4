//! Data models shared by the provider client and the link generator
//!
//! ```rust
//! use nodelinks::models::NodeSummary;
//! use serde_json::json;
//!
//! let node: NodeSummary = serde_json::from_value(json!({"nodeId": 42})).unwrap();
//! assert_eq!(node.label(), "Node-42");
//! ```

pub mod app_state;
pub mod client_config;
pub mod node;
pub mod session;

pub use app_state::AppState;
pub use client_config::{ClientConfig, ConfigError, Protocol};
pub use node::{NodeId, NodeSummary};
pub use session::Session;
