//! Typed view of a provider `clientConfig` payload
//!
//! The payload is an Xray-style outbound:
//!
//! ```json
//! {
//!   "protocol": "vless",
//!   "settings": { "vnext": [ { "address": "...", "port": 443, "users": [ { "id": "..." } ] } ] },
//!   "streamSettings": { "network": "tcp", "security": "reality", "realitySettings": { ... } }
//! }
//! ```

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    VMess,
    VLess,
}

impl Protocol {
    /// Case-insensitive match against the supported protocol tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "vmess" => Some(Protocol::VMess),
            "vless" => Some(Protocol::VLess),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::VMess => "vmess",
            Protocol::VLess => "vless",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported protocol: {0:?}")]
    Unsupported(String),

    #[error("invalid client config: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnextUser {
    pub id: String,
    #[serde(default)]
    pub alter_id: Option<u32>,
    #[serde(default)]
    pub security: Option<String>,
    #[serde(default)]
    pub encryption: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct VnextServer {
    address: String,
    port: u16,
    #[serde(default)]
    users: Vec<VnextUser>,
}

#[derive(Debug, Clone, Deserialize)]
struct OutboundSettings {
    #[serde(default)]
    vnext: Vec<VnextServer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TcpHeader {
    #[serde(rename = "type", default)]
    pub header_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TcpSettings {
    #[serde(default)]
    pub header: Option<TcpHeader>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealitySettings {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub short_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub network: String,
    #[serde(default)]
    pub security: Option<String>,
    #[serde(default)]
    pub tcp_settings: Option<TcpSettings>,
    #[serde(default)]
    pub reality_settings: Option<RealitySettings>,
}

impl StreamSettings {
    /// Transport security mode, `none` when absent.
    pub fn security(&self) -> &str {
        self.security.as_deref().unwrap_or("none")
    }

    pub fn is_reality(&self) -> bool {
        self.security.as_deref() == Some("reality")
    }

    /// TCP header obfuscation type, `none` when absent.
    pub fn header_type(&self) -> &str {
        self.tcp_settings
            .as_ref()
            .and_then(|tcp| tcp.header.as_ref())
            .and_then(|header| header.header_type.as_deref())
            .unwrap_or("none")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClientConfig {
    settings: OutboundSettings,
    stream_settings: StreamSettings,
}

/// A validated vmess/vless outbound: first server, first user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub protocol: Protocol,
    pub address: String,
    pub port: u16,
    pub user: VnextUser,
    pub stream: StreamSettings,
}

impl ClientConfig {
    /// Reads the protocol tag first, so unsupported protocols are reported
    /// as such rather than as schema errors.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let tag = value
            .get("protocol")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let protocol =
            Protocol::parse(tag).ok_or_else(|| ConfigError::Unsupported(tag.to_string()))?;

        let raw: RawClientConfig = serde_json::from_value(value)?;
        let server = raw
            .settings
            .vnext
            .into_iter()
            .next()
            .ok_or(ConfigError::MissingField("settings.vnext"))?;
        let user = server
            .users
            .into_iter()
            .next()
            .ok_or(ConfigError::MissingField("settings.vnext[0].users"))?;

        Ok(ClientConfig {
            protocol,
            address: server.address,
            port: server.port,
            user,
            stream: raw.stream_settings,
        })
    }
}
