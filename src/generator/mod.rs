pub mod links;

pub use links::{config_to_link, LinkError};
