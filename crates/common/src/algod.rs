//! Algod REST Client
//!
//! [`ChainRpc`] implementation over the Algorand node REST API.
//!
//! ## Endpoint Mapping
//!
//! | Query | Endpoint | Absent |
//! |-------|----------|--------|
//! | global state | `GET /v2/applications/{id}` | 404 |
//! | box | `GET /v2/applications/{id}/box?name=b64:..` | 404 |
//! | created apps | `GET /v2/accounts/{address}` | 404 → `[]` |
//! | current round | `GET /v2/status` | never |
//!
//! Transient failures (timeout, connect, 5xx) are retried up to
//! `retry_count` times with a doubling delay. Everything else surfaces on
//! the first attempt.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dstake_proto::{Address, GlobalState, TealValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::ChainConfig;
use crate::rpc::{ChainRpc, FetchError};

/// Header carrying the node API token.
pub const TOKEN_HEADER: &str = "X-Algo-API-Token";

const TEAL_TYPE_BYTES: u8 = 1;
const TEAL_TYPE_UINT: u8 = 2;

// ════════════════════════════════════════════════════════════════════════════
// WIRE TYPES
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct ApplicationResponse {
    params: ApplicationParams,
}

#[derive(Debug, Deserialize)]
struct ApplicationParams {
    #[serde(rename = "global-state", default)]
    global_state: Vec<TealKeyValue>,
}

#[derive(Debug, Deserialize)]
struct TealKeyValue {
    key: String,
    value: TealValueJson,
}

#[derive(Debug, Deserialize)]
struct TealValueJson {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    bytes: String,
    #[serde(default)]
    uint: u64,
}

#[derive(Debug, Deserialize)]
struct BoxResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(rename = "created-apps", default)]
    created_apps: Vec<CreatedApp>,
}

#[derive(Debug, Deserialize)]
struct CreatedApp {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "last-round")]
    last_round: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// CLIENT
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct AlgodClient {
    client: reqwest::Client,
    config: ChainConfig,
    base_url: String,
}

impl AlgodClient {
    /// Build a client from `config`.
    ///
    /// No request is made here; the node is first contacted by the first query.
    ///
    /// # Errors
    ///
    /// `FetchError::Network` if the HTTP client cannot be built.
    pub fn new(config: ChainConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {}", e)))?;
        let base_url = config.algod_url.trim_end_matches('/').to_string();
        Ok(Self { client, config, base_url })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// GET `path` and parse the JSON body. HTTP 404 is `Ok(None)`.
    ///
    /// Retries transient errors with exponential backoff.
    async fn get_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, FetchError> {
        let mut last_error = FetchError::Timeout;
        let mut retry_delay = self.config.retry_delay_ms;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                warn!(op, attempt, retry_count = self.config.retry_count, "retrying algod request");
                tokio::time::sleep(Duration::from_millis(retry_delay)).await;
                retry_delay = retry_delay.saturating_mul(2);
            }

            match self.send_get(path, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() => {
                    warn!(op, attempt, error = %e, "transient algod error");
                    last_error = e;
                }
                Err(e) => {
                    error!(op, error = %e, "algod request failed");
                    return Err(e);
                }
            }
        }

        error!(op, retry_count = self.config.retry_count, error = %last_error, "all retries exhausted");
        Err(last_error)
    }

    async fn send_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "algod GET");

        let mut req = self.client.get(&url).query(query);
        if let Some(ref token) = self.config.algod_token {
            req = req.header(TOKEN_HEADER, token);
        }

        let response = req.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(%url, "algod returned 404");
            return Ok(None);
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| FetchError::InvalidResponse(format!("failed to parse response: {}", e)))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Unavailable(e.to_string())
    } else {
        FetchError::Network(format!("request failed: {}", e))
    }
}

fn decode_base64(field: &str, raw: &str) -> Result<Vec<u8>, FetchError> {
    BASE64
        .decode(raw)
        .map_err(|e| FetchError::InvalidResponse(format!("{} is not valid base64: {}", field, e)))
}

fn into_global_state(entries: Vec<TealKeyValue>) -> Result<GlobalState, FetchError> {
    let mut state = GlobalState::new();
    for entry in entries {
        let key = decode_base64("global-state key", &entry.key)?;
        let value = match entry.value.kind {
            TEAL_TYPE_BYTES => TealValue::Bytes(decode_base64("global-state bytes", &entry.value.bytes)?),
            TEAL_TYPE_UINT => TealValue::Uint(entry.value.uint),
            other => {
                return Err(FetchError::InvalidResponse(format!(
                    "unknown TEAL value type {}",
                    other
                )))
            }
        };
        state.insert(key, value);
    }
    Ok(state)
}

impl ChainRpc for AlgodClient {
    async fn get_application_global_state(
        &self,
        app_id: u64,
    ) -> Result<Option<GlobalState>, FetchError> {
        let path = format!("/v2/applications/{}", app_id);
        match self.get_json::<ApplicationResponse>("global_state", &path, &[]).await? {
            Some(app) => into_global_state(app.params.global_state).map(Some),
            None => Ok(None),
        }
    }

    async fn get_application_box(
        &self,
        app_id: u64,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, FetchError> {
        let path = format!("/v2/applications/{}/box", app_id);
        let name = format!("b64:{}", BASE64.encode(key));
        match self.get_json::<BoxResponse>("box", &path, &[("name", name)]).await? {
            Some(b) => decode_base64("box value", &b.value).map(Some),
            None => Ok(None),
        }
    }

    async fn get_account_created_apps(&self, address: &Address) -> Result<Vec<u64>, FetchError> {
        let path = format!("/v2/accounts/{}", address);
        let exclude = ("exclude", "assets,apps-local-state,created-assets".to_string());
        let account = self.get_json::<AccountResponse>("account", &path, &[exclude]).await?;
        Ok(account
            .map(|a| a.created_apps.into_iter().map(|app| app.id).collect())
            .unwrap_or_default())
    }

    async fn get_current_round(&self) -> Result<u64, FetchError> {
        match self.get_json::<StatusResponse>("status", "/v2/status", &[]).await? {
            Some(s) => Ok(s.last_round),
            None => Err(FetchError::Status {
                status: 404,
                body: "status endpoint not found".to_string(),
            }),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AlgodClient {
        let config = ChainConfig {
            algod_url: server.uri(),
            retry_delay_ms: 1,
            ..Default::default()
        };
        AlgodClient::new(config).expect("client")
    }

    #[tokio::test]
    async fn test_global_state_decodes_bytes_and_uints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/applications/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "params": {
                    "creator": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ",
                    "global-state": [
                        { "key": BASE64.encode("round_start"), "value": { "type": 2, "uint": 100 } },
                        { "key": BASE64.encode("state"), "value": { "type": 1, "bytes": BASE64.encode([0x03u8]) } }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let gs = client_for(&server)
            .get_application_global_state(42)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(gs.uint("round_start"), Ok(100));
        assert_eq!(gs.byte("state"), Ok(0x03));
    }

    #[tokio::test]
    async fn test_missing_application_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/applications/7"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "application does not exist" })))
            .mount(&server)
            .await;

        let result = client_for(&server).get_application_global_state(7).await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_app_without_global_state_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/applications/8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 8, "params": {} })))
            .mount(&server)
            .await;

        let gs = client_for(&server).get_application_global_state(8).await.expect("fetch");
        assert_eq!(gs.map(|g| g.is_empty()), Some(true));
    }

    #[tokio::test]
    async fn test_box_query_uses_b64_name() {
        let server = MockServer::start().await;
        let key = [0xAAu8; 32];
        Mock::given(method("GET"))
            .and(path("/v2/applications/5/box"))
            .and(query_param("name", format!("b64:{}", BASE64.encode(key)).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": BASE64.encode(key),
                "round": 10,
                "value": BASE64.encode([1u8, 2, 3]),
            })))
            .mount(&server)
            .await;

        let value = client_for(&server).get_application_box(5, &key).await.expect("fetch");
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client_for(&server).get_current_round().await;
        assert_eq!(result, Err(FetchError::Status { status: 500, body: "boom".to_string() }));
    }

    #[tokio::test]
    async fn test_retry_count_respected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = ChainConfig {
            algod_url: server.uri(),
            retry_count: 2,
            retry_delay_ms: 1,
            ..Default::default()
        };
        let client = AlgodClient::new(config).expect("client");
        assert!(client.get_current_round().await.is_err());

        let received = server.received_requests().await.unwrap_or_default();
        assert_eq!(received.len(), 3);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/status"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let config = ChainConfig {
            algod_url: server.uri(),
            retry_count: 3,
            retry_delay_ms: 1,
            ..Default::default()
        };
        let client = AlgodClient::new(config).expect("client");
        assert!(matches!(
            client.get_current_round().await,
            Err(FetchError::Status { status: 401, .. })
        ));
        let received = server.received_requests().await.unwrap_or_default();
        assert_eq!(received.len(), 1);
    }

    #[tokio::test]
    async fn test_token_header_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/status"))
            .and(header(TOKEN_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last-round": 1234 })))
            .mount(&server)
            .await;

        let config = ChainConfig {
            algod_url: server.uri(),
            algod_token: Some("secret".to_string()),
            ..Default::default()
        };
        let client = AlgodClient::new(config).expect("client");
        assert_eq!(client.get_current_round().await, Ok(1234));
    }

    #[tokio::test]
    async fn test_created_apps_unknown_account_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let apps = client_for(&server).get_account_created_apps(&Address::ZERO).await;
        assert_eq!(apps, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_created_apps_listed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v2/accounts/{}", Address::ZERO).as_str()))
            .and(query_param("exclude", "assets,apps-local-state,created-assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "address": Address::ZERO.to_string(),
                "created-apps": [ { "id": 11 }, { "id": 12 } ]
            })))
            .mount(&server)
            .await;

        let apps = client_for(&server).get_account_created_apps(&Address::ZERO).await;
        assert_eq!(apps, Ok(vec![11, 12]));
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).get_current_round().await,
            Err(FetchError::InvalidResponse(_))
        ));
    }
}
