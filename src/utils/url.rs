//! URL encoding utilities

use url::form_urlencoded;

/// Encodes a string using percent encoding
///
/// Used for the `#remark` fragment of share links.
///
/// # Examples
/// ```
/// use nodelinks::utils::url::url_encode;
///
/// let encoded = url_encode("Hello World!");
/// assert_eq!(encoded, "Hello%20World%21");
/// ```
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Percent-encodes a share-link remark, leaving `/` as is.
///
/// # Examples
/// ```
/// use nodelinks::utils::url::url_encode_remark;
///
/// assert_eq!(url_encode_remark("HK/01 ~x"), "HK/01%20~x");
/// ```
pub fn url_encode_remark(input: &str) -> String {
    url_encode(input).replace("%2F", "/")
}

/// Decodes a URL-encoded string
///
/// Returns the original string if decoding fails.
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Builds an `application/x-www-form-urlencoded` query string, keeping
/// the order of `params`.
///
/// # Examples
/// ```
/// use nodelinks::utils::url::build_query;
///
/// let query = build_query(&[("security", "none"), ("sni", "a b")]);
/// assert_eq!(query, "security=none&sni=a+b");
/// ```
pub fn build_query(params: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Parses a query string into ordered key/value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
