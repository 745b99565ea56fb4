use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Proxy;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 15;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to send request: {0}")]
    Send(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to decode JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub proxy: Option<String>,
}

/// Parses the outbound proxy setting. `NONE` and the empty string disable it.
pub fn parse_proxy(proxy_str: &str) -> ProxyConfig {
    if proxy_str.is_empty() || proxy_str == "NONE" {
        return ProxyConfig { proxy: None };
    }
    ProxyConfig {
        proxy: Some(proxy_str.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A single POST to a provider endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn json(url: impl Into<String>, body: Value) -> Self {
        ApiRequest {
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Json(body),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        }
    }

    pub fn form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        ApiRequest {
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Form(fields),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// First `max` characters of the body, for log lines.
    pub fn snippet(&self, max: usize) -> String {
        self.body.chars().take(max).collect()
    }
}

/// Blocking request executor. Non-2xx statuses are returned as responses,
/// only connection-level failures are errors.
pub trait HttpTransport {
    fn post(&self, request: &ApiRequest) -> Result<HttpResponse, HttpError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn post(&self, request: &ApiRequest) -> Result<HttpResponse, HttpError> {
        (**self).post(request)
    }
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(proxy_config: &ProxyConfig) -> Result<Self, HttpError> {
        let mut client_builder = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT))
            .gzip(true);

        if let Some(proxy) = &proxy_config.proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| HttpError::Client(format!("Failed to set proxy: {}", e)))?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post(&self, request: &ApiRequest) -> Result<HttpResponse, HttpError> {
        let mut request_builder = self.client.post(&request.url).timeout(request.timeout);
        for (key, value) in &request.headers {
            request_builder = request_builder.header(key.as_str(), value.as_str());
        }
        request_builder = match &request.body {
            RequestBody::Json(body) => request_builder.json(body),
            RequestBody::Form(fields) => request_builder.form(fields),
        };

        let response = request_builder
            .send()
            .map_err(|e| HttpError::Send(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| HttpError::Body(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}
