use serde::Serialize;
use thiserror::Error;

use crate::models::client_config::RealitySettings;
use crate::models::{ClientConfig, Protocol};
use crate::utils::base64::url_safe_base64_encode;
use crate::utils::url::{build_query, url_encode_remark};

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("failed to serialize vmess payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// `vmess://` JSON payload. Field order is the serialized key order.
#[derive(Serialize)]
struct VmessShare<'a> {
    v: &'a str,
    ps: &'a str,
    add: &'a str,
    port: u16,
    id: &'a str,
    aid: u32,
    scy: &'a str,
    net: &'a str,
    #[serde(rename = "type")]
    header_type: &'a str,
    host: &'a str,
    path: &'a str,
    tls: &'a str,
    sni: &'a str,
}

/// Convert a client config to its share link
///
/// # Arguments
/// * `config` - Validated vmess/vless outbound
/// * `label` - Human readable remark
pub fn config_to_link(config: &ClientConfig, label: &str) -> Result<String, LinkError> {
    match config.protocol {
        Protocol::VMess => vmess_link(config, label),
        Protocol::VLess => vless_link(config, label),
    }
}

fn vmess_link(config: &ClientConfig, label: &str) -> Result<String, LinkError> {
    // Format: vmess://URLSAFE_BASE64(JSON), unpadded
    let share = VmessShare {
        v: "2",
        ps: label,
        add: &config.address,
        port: config.port,
        id: &config.user.id,
        aid: config.user.alter_id.unwrap_or(0),
        scy: config.user.security.as_deref().unwrap_or("auto"),
        net: &config.stream.network,
        header_type: config.stream.header_type(),
        host: "",
        path: "",
        tls: config.stream.security(),
        sni: "",
    };
    let json_str = serde_json::to_string(&share)?;
    Ok(format!("vmess://{}", url_safe_base64_encode(&json_str)))
}

fn reality_field<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, LinkError> {
    value.as_deref().ok_or(LinkError::MissingField(name))
}

fn vless_link(config: &ClientConfig, label: &str) -> Result<String, LinkError> {
    // Format: vless://uuid@server:port?query#remark
    let stream = &config.stream;
    let query = if stream.is_reality() {
        let reality: &RealitySettings = stream
            .reality_settings
            .as_ref()
            .ok_or(LinkError::MissingField("streamSettings.realitySettings"))?;
        build_query(&[
            ("security", "reality"),
            (
                "encryption",
                config.user.encryption.as_deref().unwrap_or("none"),
            ),
            (
                "pbk",
                reality_field(&reality.public_key, "realitySettings.publicKey")?,
            ),
            ("headerType", "none"),
            (
                "fp",
                reality_field(&reality.fingerprint, "realitySettings.fingerprint")?,
            ),
            ("type", stream.network.as_str()),
            (
                "sni",
                reality_field(&reality.server_name, "realitySettings.serverName")?,
            ),
            (
                "sid",
                reality_field(&reality.short_id, "realitySettings.shortId")?,
            ),
        ])
    } else {
        build_query(&[("security", stream.security())])
    };

    Ok(format!(
        "vless://{}@{}:{}?{}#{}",
        config.user.id,
        config.address,
        config.port,
        query,
        url_encode_remark(label)
    ))
}
