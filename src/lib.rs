pub mod api;
pub mod constants;
pub mod generator;
pub mod interfaces;
pub mod models;
pub mod output;
pub mod settings;
pub mod utils;
#[cfg(feature = "web-api")]
pub mod web_handlers;

// Re-export the pipeline entry points for easier access
pub use generator::config_to_link;
pub use interfaces::{harvest, HarvestError, HarvestReport};
pub use models::{ClientConfig, NodeSummary, Protocol, Session};
pub use settings::Settings;
