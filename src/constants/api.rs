// Request defaults for provider endpoints
pub const CONFIG_USER_AGENT: &str = "ktor-client";
pub const CATALOG_USER_AGENT: &str = "okhttp/4.12.0";

pub const LOGIN_TIMEOUT_SECS: u64 = 15;
pub const LIST_TIMEOUT_SECS: u64 = 15;
pub const CLIENT_CONFIG_TIMEOUT_SECS: u64 = 12;

pub const DEFAULT_CLIENT_ID: &str = "vpn-user";
pub const DEFAULT_PLATFORM: &str = "android";
pub const DEFAULT_DEVICE_TYPE: &str = "1";

/// Business status code for success in share-link catalog responses
pub const CATALOG_CODE_OK: i64 = 1;

/// Maximum characters of a failed response body included in logs and errors
pub const BODY_SNIPPET_LEN: usize = 300;
