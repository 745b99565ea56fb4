use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};

use nodelinks::output::FileSink;
use nodelinks::settings::{Credentials, PasswordCredentials, TokenPairCredentials};
use nodelinks::utils::base64::url_safe_base64_decode;
use nodelinks::utils::http::{ApiRequest, HttpError, HttpResponse, HttpTransport, RequestBody};
use nodelinks::utils::retry::{RetryPolicy, Sleeper};
use nodelinks::{harvest, HarvestError, Settings};

const API: &str = "https://api.example.com/user";
const AUTH: &str = "https://id.example.com/token";

/// Routes requests by URL and, for clientConfig, by node id.
struct FakeProvider {
    login: Result<HttpResponse, u16>,
    node_list: String,
    configs: HashMap<String, Vec<HttpResponse>>,
    catalog: String,
    requests: RefCell<Vec<ApiRequest>>,
}

fn resp(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}

impl FakeProvider {
    fn new(node_list: Value) -> Self {
        FakeProvider {
            login: Ok(resp(200, r#"{"access_token":"tok","expires_in":3600}"#)),
            node_list: node_list.to_string(),
            configs: HashMap::new(),
            catalog: String::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Responses for a node, served in order; the last one repeats.
    fn config(mut self, node_id: &str, responses: Vec<HttpResponse>) -> Self {
        self.configs.insert(node_id.to_string(), responses);
        self
    }

    fn count(&self, suffix: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }
}

impl HttpTransport for FakeProvider {
    fn post(&self, request: &ApiRequest) -> Result<HttpResponse, HttpError> {
        self.requests.borrow_mut().push(request.clone());
        if request.url == AUTH {
            return match &self.login {
                Ok(r) => Ok(r.clone()),
                Err(status) => Ok(resp(*status, "denied")),
            };
        }
        if request.url.starts_with(&format!("{}/nodeList?", API)) {
            return Ok(resp(200, &self.node_list));
        }
        if request.url == format!("{}/nodeListV2", API) {
            return Ok(resp(200, &self.catalog));
        }
        if request.url == format!("{}/clientConfig", API) {
            let node_id = match &request.body {
                RequestBody::Json(body) => body["nodeId"].to_string(),
                RequestBody::Form(_) => panic!("clientConfig must be JSON"),
            };
            let seen = self
                .requests
                .borrow()
                .iter()
                .filter(|r| r.body == request.body)
                .count();
            let responses = self
                .configs
                .get(&node_id)
                .unwrap_or_else(|| panic!("no config for node {}", node_id));
            let index = (seen - 1).min(responses.len() - 1);
            return Ok(responses[index].clone());
        }
        Err(HttpError::Send(format!("unexpected url {}", request.url)))
    }
}

#[derive(Default)]
struct RecordingSleeper {
    delays: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.borrow_mut().push(duration);
    }
}

fn password_settings() -> Settings {
    Settings {
        api_base: API.to_string(),
        platform: "android".to_string(),
        credentials: Credentials::Password(PasswordCredentials {
            auth_url: AUTH.to_string(),
            client_id: "vpn-user".to_string(),
            client_secret: "s3".to_string(),
            username: "alice".to_string(),
            password: "secret".to_string(),
        }),
        retry: RetryPolicy::new(4, 2.0),
        output: None,
        proxy: String::new(),
        listen_address: "127.0.0.1".to_string(),
        listen_port: 8080,
    }
}

fn vmess_config() -> String {
    json!({
        "protocol": "vmess",
        "settings": {"vnext": [{
            "address": "a.example.com",
            "port": 443,
            "users": [{"id": "11111111-1111-4111-8111-111111111111"}]
        }]},
        "streamSettings": {"network": "tcp"}
    })
    .to_string()
}

fn vless_reality_config() -> String {
    json!({
        "protocol": "vless",
        "settings": {"vnext": [{
            "address": "b.example.com",
            "port": 8443,
            "users": [{"id": "22222222-2222-4222-8222-222222222222", "encryption": "none"}]
        }]},
        "streamSettings": {
            "network": "tcp",
            "security": "reality",
            "realitySettings": {
                "publicKey": "pbk-value",
                "fingerprint": "chrome",
                "serverName": "www.example.org",
                "shortId": "abcd"
            }
        }
    })
    .to_string()
}

fn trojan_config() -> String {
    json!({
        "protocol": "trojan",
        "settings": {"servers": [{"address": "c.example.com", "port": 443, "password": "p"}]}
    })
    .to_string()
}

#[test]
fn test_mixed_protocols_emit_in_order() {
    let provider = FakeProvider::new(json!([
        {"nodeId": 1, "nameCn": "A"},
        {"nodeId": 2, "nameEn": "B"},
        {"nodeId": 3, "regionNameCn": "C"}
    ]))
    .config("1", vec![resp(200, &vmess_config())])
    .config("2", vec![resp(200, &vless_reality_config())])
    .config("3", vec![resp(200, &trojan_config())]);
    let sleeper = RecordingSleeper::default();
    let mut sink: Vec<String> = Vec::new();

    let report = harvest(&password_settings(), &provider, &sleeper, &mut sink).unwrap();

    assert_eq!(sink.len(), 2);
    assert!(sink[0].starts_with("vmess://"));
    let payload: Value =
        serde_json::from_str(&url_safe_base64_decode(&sink[0]["vmess://".len()..])).unwrap();
    assert_eq!(payload["ps"], json!("A"));
    assert_eq!(payload["add"], json!("a.example.com"));

    assert!(sink[1].starts_with("vless://22222222-2222-4222-8222-222222222222@b.example.com:8443?"));
    assert!(sink[1].contains("headerType=none"));
    assert!(sink[1].ends_with("#B"));

    assert_eq!(report.listed, 3);
    assert_eq!(report.emitted, 2);
    assert_eq!(report.skipped, 1);
    assert!(sleeper.delays.borrow().is_empty());
}

#[test]
fn test_flaky_node_is_retried_and_dead_node_skipped() {
    let provider = FakeProvider::new(json!([
        {"nodeId": 1, "nameCn": "flaky"},
        {"nodeId": 2, "nameCn": "dead"},
        {"nameCn": "no id"}
    ]))
    .config(
        "1",
        vec![resp(503, ""), resp(502, ""), resp(200, &vmess_config())],
    )
    .config("2", vec![resp(500, "")]);
    let sleeper = RecordingSleeper::default();
    let mut sink: Vec<String> = Vec::new();

    let report = harvest(&password_settings(), &provider, &sleeper, &mut sink).unwrap();

    assert_eq!(sink.len(), 1);
    assert_eq!(report.skipped, 2);
    // 3 attempts for node 1, 5 for node 2
    assert_eq!(provider.count("/clientConfig"), 8);
    let secs: Vec<u64> = sleeper.delays.borrow().iter().map(|d| d.as_secs()).collect();
    assert_eq!(secs, vec![1, 2, 1, 2, 4, 8]);
}

#[test]
fn test_invalid_config_is_skipped() {
    let provider = FakeProvider::new(json!([{"nodeId": 1}, {"nodeId": 2}]))
        .config(
            "1",
            vec![resp(200, r#"{"protocol":"vless","settings":{"vnext":[]},"streamSettings":{"network":"tcp"}}"#)],
        )
        .config("2", vec![resp(200, &vless_reality_config())]);
    let mut sink: Vec<String> = Vec::new();

    harvest(
        &password_settings(),
        &provider,
        &RecordingSleeper::default(),
        &mut sink,
    )
    .unwrap();
    assert_eq!(sink.len(), 1);
    assert!(sink[0].ends_with("#Node-2"));
}

#[test]
fn test_nothing_usable_is_fatal() {
    let provider = FakeProvider::new(json!([{"nodeId": 3}]))
        .config("3", vec![resp(200, &trojan_config())]);
    let mut sink: Vec<String> = Vec::new();
    let result = harvest(
        &password_settings(),
        &provider,
        &RecordingSleeper::default(),
        &mut sink,
    );
    assert!(matches!(result, Err(HarvestError::NoLinks)));
    assert!(sink.is_empty());
}

#[test]
fn test_empty_node_list_is_fatal() {
    let provider = FakeProvider::new(json!([]));
    let mut sink: Vec<String> = Vec::new();
    let result = harvest(
        &password_settings(),
        &provider,
        &RecordingSleeper::default(),
        &mut sink,
    );
    assert!(matches!(result, Err(HarvestError::NoNodes)));
    assert_eq!(provider.count("/clientConfig"), 0);
}

#[test]
fn test_login_failure_stops_the_run() {
    let mut provider = FakeProvider::new(json!([{"nodeId": 1}]));
    provider.login = Err(401);
    let mut sink: Vec<String> = Vec::new();
    let result = harvest(
        &password_settings(),
        &provider,
        &RecordingSleeper::default(),
        &mut sink,
    );
    assert!(matches!(result, Err(HarvestError::Auth(_))));
    assert_eq!(provider.requests.borrow().len(), 1);
}

#[test]
fn test_share_link_catalog() {
    let mut provider = FakeProvider::new(json!([]));
    provider.catalog = json!({
        "code": 1,
        "data": [
            {"node": [{"url": "ss://YWVzLTI1Ni1nY206cA@h:1#x"}, {"url": "  "}]},
            {"node": [{"url": "trojan://p@h:443#y"}]}
        ]
    })
    .to_string();
    let mut settings = password_settings();
    settings.credentials = Credentials::TokenPair(TokenPairCredentials {
        token: "jwt".to_string(),
        auth_token: "auth".to_string(),
        device_id: "my-device".to_string(),
        device_type: "1".to_string(),
    });
    let mut sink: Vec<String> = Vec::new();

    let report = harvest(&settings, &provider, &RecordingSleeper::default(), &mut sink).unwrap();
    assert_eq!(sink, vec!["ss://YWVzLTI1Ni1nY206cA@h:1#x", "trojan://p@h:443#y"]);
    assert_eq!(report.emitted, 2);
    // No login exchange for a pre-issued token pair
    assert_eq!(provider.requests.borrow().len(), 1);
    assert!(provider.requests.borrow()[0]
        .headers
        .contains(&("token".to_string(), "jwt".to_string())));
}

#[test]
fn test_share_link_business_failure() {
    let mut provider = FakeProvider::new(json!([]));
    provider.catalog = json!({"code": 0, "message": "expired"}).to_string();
    let mut settings = password_settings();
    settings.credentials = Credentials::TokenPair(TokenPairCredentials {
        token: "jwt".to_string(),
        auth_token: "auth".to_string(),
        device_id: "my-device".to_string(),
        device_type: "1".to_string(),
    });
    let mut sink: Vec<String> = Vec::new();
    let result = harvest(&settings, &provider, &RecordingSleeper::default(), &mut sink);
    assert!(matches!(result, Err(HarvestError::List(_))));
}

#[test]
fn test_file_sink_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.txt");
    std::fs::write(&path, "old-link\n").unwrap();

    let provider = FakeProvider::new(json!([{"nodeId": 1, "nameCn": "香港"}, {"nodeId": 2}]))
        .config("1", vec![resp(200, &vmess_config())])
        .config("2", vec![resp(200, &vless_reality_config())]);
    let mut sink = FileSink::create(&path).unwrap();
    harvest(
        &password_settings(),
        &provider,
        &RecordingSleeper::default(),
        &mut sink,
    )
    .unwrap();
    drop(sink);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("vmess://"));
    assert!(lines[1].starts_with("vless://"));
    assert!(!content.contains("old-link"));
}
