// # HTTP Lookup Client
//
// This crate provides the reqwest-based LookupClient for namewatch.
//
// ## Services
//
// - Name history: `GET <history_url><name>` → `{"success", "data", "message"}`
// - Availability: `GET <availability_url><name>` → 200 taken, 404/204 available
// - Cross-platform: `GET <bedrock_url><gamertag>` → XUID body, quoted or bare
//
// ## Constraints
//
// - One HTTP request per call
// - No retries, no caching, no background tasks
// - Fixed `User-Agent` and `Accept: application/json` on every request
// - Connect timeout is the caller's connect timeout; one pooled
//   reqwest::Client per distinct connect timeout
// - Per-request timeout is connect + read of the caller's timeouts

use async_trait::async_trait;
use namewatch_core::config::{EndpointConfig, LookupConfig};
use namewatch_core::traits::{AvailabilityLookup, HistoryLookup, LookupClient, LookupTimeouts};
use namewatch_core::{Error, Result};
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Response envelope of the history service
#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// reqwest-backed identity lookup client
#[derive(Debug, Clone)]
pub struct HttpLookupClient {
    endpoints: EndpointConfig,
    user_agent: String,

    /// Clients keyed by connect timeout
    ///
    /// reqwest only takes a connect timeout at build time.
    clients: Arc<RwLock<HashMap<Duration, reqwest::Client>>>,
}

impl HttpLookupClient {
    /// Create a client for the given endpoints
    ///
    /// # Errors
    ///
    /// - `Error::Config`: Endpoint URLs or User-Agent are invalid
    pub fn new(endpoints: EndpointConfig, lookup: &LookupConfig) -> Result<Self> {
        endpoints.validate()?;
        lookup.validate()?;

        let mut clients = HashMap::new();
        for connect in [
            lookup.on_demand_timeouts().connect,
            lookup.bedrock_timeouts().connect,
        ] {
            clients.insert(connect, build_client(&lookup.user_agent, connect)?);
        }

        Ok(Self {
            endpoints,
            user_agent: lookup.user_agent.clone(),
            clients: Arc::new(RwLock::new(clients)),
        })
    }

    /// Connect timeouts that currently have a client, ascending
    pub async fn connect_timeouts(&self) -> Vec<Duration> {
        let mut timeouts: Vec<Duration> = self.clients.read().await.keys().copied().collect();
        timeouts.sort();
        timeouts
    }

    /// Client enforcing `connect`, built on first use
    async fn client_for(&self, connect: Duration) -> Result<reqwest::Client> {
        if let Some(client) = self.clients.read().await.get(&connect) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(&connect) {
            return Ok(client.clone());
        }

        tracing::debug!("Building HTTP client with {:?} connect timeout", connect);
        let client = build_client(&self.user_agent, connect)?;
        clients.insert(connect, client.clone());
        Ok(client)
    }

    /// Endpoint URLs in use
    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    /// GET `base` + `segment`, returning status and body
    async fn fetch(
        &self,
        service: &str,
        base: &str,
        segment: &str,
        timeouts: LookupTimeouts,
    ) -> Result<(u16, String)> {
        let url = endpoint_url(base, segment)?;
        tracing::debug!("GET {} ({})", url, service);

        let response = self
            .client_for(timeouts.connect)
            .await?
            .get(url)
            .timeout(timeouts.total())
            .send()
            .await
            .map_err(|e| Error::transport(format!("{} request failed: {}", service, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read {} response: {}", service, e)))?;

        tracing::trace!("{} answered {} ({} bytes)", service, status, body.len());
        Ok((status, body))
    }
}

#[async_trait]
impl LookupClient for HttpLookupClient {
    async fn name_history(&self, name: &str, timeouts: LookupTimeouts) -> Result<HistoryLookup> {
        let (status, body) = self
            .fetch("history", &self.endpoints.history_url, name, timeouts)
            .await?;
        classify_history(status, &body)
    }

    async fn availability(
        &self,
        name: &str,
        timeouts: LookupTimeouts,
    ) -> Result<AvailabilityLookup> {
        let (status, body) = self
            .fetch("availability", &self.endpoints.availability_url, name, timeouts)
            .await?;
        classify_availability(status, &body)
    }

    async fn resolve_xuid(
        &self,
        gamertag: &str,
        timeouts: LookupTimeouts,
    ) -> Result<Option<String>> {
        let (status, body) = self
            .fetch("bedrock", &self.endpoints.bedrock_url, gamertag, timeouts)
            .await?;
        classify_xuid(status, &body)
    }

    fn client_name(&self) -> &'static str {
        "http"
    }
}

fn build_client(user_agent: &str, connect: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .connect_timeout(connect)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// Append `segment` to `base` as one percent-encoded path segment
pub fn endpoint_url(base: &str, segment: &str) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| Error::config(format!("Invalid endpoint {}: {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| Error::config(format!("Endpoint cannot take a path: {}", base)))?
        .pop_if_empty()
        .push(segment);

    Ok(url)
}

/// Map a history response to its outcome
///
/// Non-200 answers with a JSON failure payload are rejections; other
/// non-200 answers are unexpected.
pub fn classify_history(status: u16, body: &str) -> Result<HistoryLookup> {
    match status {
        404 | 204 => Ok(HistoryLookup::NotFound),
        200 => {
            let envelope: HistoryEnvelope = serde_json::from_str(body).map_err(|e| {
                Error::lookup("history", format!("Malformed response: {}", e))
            })?;

            if !envelope.success {
                return Ok(HistoryLookup::Rejected {
                    message: envelope
                        .message
                        .unwrap_or_else(|| "Player not found".to_string()),
                });
            }

            match envelope.data {
                Some(data) if !data.is_null() => Ok(HistoryLookup::Found(data)),
                _ => Ok(HistoryLookup::Empty),
            }
        }
        _ => match serde_json::from_str::<HistoryEnvelope>(body) {
            Ok(HistoryEnvelope {
                message: Some(message),
                ..
            }) => Ok(HistoryLookup::Rejected { message }),
            _ => Err(Error::unexpected_status("history", status)),
        },
    }
}

/// Map an availability response to its outcome
///
/// Anything but 200, 204 and 404 is an error, which callers treat as unknown.
pub fn classify_availability(status: u16, body: &str) -> Result<AvailabilityLookup> {
    match status {
        404 | 204 => Ok(AvailabilityLookup::Available),
        200 => {
            let current_owner = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|json| json.get("username")?.as_str().map(str::to_string));
            Ok(AvailabilityLookup::Taken { current_owner })
        }
        _ => Err(Error::unexpected_status("availability", status)),
    }
}

/// Extract the XUID from a cross-platform lookup response
///
/// Accepts a bare number, a quoted string, or an object with an `xuid` field.
pub fn classify_xuid(status: u16, body: &str) -> Result<Option<String>> {
    match status {
        200 => {}
        404 | 204 => return Ok(None),
        _ => return Err(Error::unexpected_status("bedrock", status)),
    }

    let xuid = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("xuid") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        },
        Ok(Value::Number(n)) => n.to_string(),
        Ok(Value::String(s)) => s,
        _ => body.replace('"', ""),
    };

    let xuid = xuid.trim();
    if xuid.is_empty() || xuid == "null" {
        Ok(None)
    } else {
        Ok(Some(xuid.to_string()))
    }
}
