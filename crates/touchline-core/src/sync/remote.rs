//! Remote copy of the payload behind the `local-sync` endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{SyncEnvelope, SyncPayload, Versionstamp};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const API_KEY_HEADER: &str = "X-API-KEY";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Authoritative remote store. The remote is the only allocator of
/// versionstamps.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Fetch the current versionstamp and payload.
    async fn fetch(&self, token: &str) -> Result<SyncEnvelope>;

    /// Fetch only the current versionstamp; an empty remote is `UNSYNCED`.
    async fn fetch_versionstamp(&self, token: &str) -> Result<Versionstamp>;

    /// Store a payload, expecting the remote to still be at `expected`.
    /// Returns the newly allocated versionstamp.
    async fn store(
        &self,
        token: &str,
        payload: &SyncPayload,
        expected: &Versionstamp,
    ) -> Result<Versionstamp>;
}

/// `RemoteStore` over HTTP.
#[derive(Clone, Debug)]
pub struct HttpRemoteStore {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct PushRequest<'a> {
    token: &'a str,
    data: &'a SyncPayload,
    versionstamp: &'a Versionstamp,
}

#[derive(Debug, Default, Deserialize)]
struct VersionProbe {
    #[serde(default)]
    versionstamp: Option<Versionstamp>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpRemoteStore {
    /// `endpoint` is the full resource URL, e.g. `https://host/local-sync/`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = normalize_text_option(Some(endpoint.into()))
            .ok_or_else(|| Error::Validation("sync endpoint must not be empty".to_string()))?;
        if !is_http_url(&endpoint) {
            return Err(Error::Validation(
                "sync endpoint must include http:// or https://".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| Error::Network(format!("failed to build HTTP client: {error}")))?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_body(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(API_KEY_HEADER, token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(Error::Network(parse_api_error(status, &body)));
        }
        Ok(body)
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self, token: &str) -> Result<SyncEnvelope> {
        let body = self.get_body(token).await?;
        SyncEnvelope::from_json(&body)
    }

    async fn fetch_versionstamp(&self, token: &str) -> Result<Versionstamp> {
        let body = self.get_body(token).await?;
        let probe: VersionProbe = serde_json::from_str(&body)
            .map_err(|error| Error::Parse(format!("invalid sync response: {error}")))?;
        Ok(probe.versionstamp.unwrap_or_default())
    }

    async fn store(
        &self,
        token: &str,
        payload: &SyncPayload,
        expected: &Versionstamp,
    ) -> Result<Versionstamp> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, token)
            .json(&PushRequest {
                token,
                data: payload,
                versionstamp: expected,
            })
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if status == StatusCode::CONFLICT {
            let remote = serde_json::from_str::<VersionProbe>(&body)
                .ok()
                .and_then(|probe| probe.versionstamp)
                .unwrap_or_else(|| Versionstamp::Text("unknown".to_string()));
            return Err(Error::Conflict {
                local: expected.clone(),
                remote,
            });
        }
        if !status.is_success() {
            return Err(Error::Network(parse_api_error(status, &body)));
        }

        serde_json::from_str::<VersionProbe>(&body)
            .ok()
            .and_then(|probe| probe.versionstamp)
            .ok_or_else(|| Error::Parse("push response has no versionstamp".to_string()))
    }
}

fn network_error(error: reqwest::Error) -> Error {
    Error::Network(error.to_string())
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
