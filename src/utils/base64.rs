use base64::{engine::general_purpose, Engine as _};

/// Encodes a string to URL-safe Base64 without padding.
///
/// This is the payload form used by `vmess://` share links.
pub fn url_safe_base64_encode(input: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(input)
}

/// Decodes a URL-safe Base64 string, with or without padding.
///
/// # Returns
/// The decoded string, or an empty string if the input is invalid.
pub fn url_safe_base64_decode(input: &str) -> String {
    match general_purpose::URL_SAFE_NO_PAD.decode(input.trim_end_matches('=')) {
        Ok(decoded) => String::from_utf8_lossy(&decoded).to_string(),
        Err(_) => String::new(),
    }
}
