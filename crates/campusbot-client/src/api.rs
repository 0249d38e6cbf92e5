//! REST client for the campusbot server.
//!
//! Every response body is read as text and parsed as JSON. A non-2xx
//! status or an `{"ok": false}` payload becomes [`CampusError::Server`]
//! carrying the server's `error` text; a request that never completes
//! becomes [`CampusError::Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use campusbot_core::backend::ChatBackend;
use campusbot_core::config::ApiConfig;
use campusbot_core::error::{CampusError, Result};
use campusbot_core::types::{
    AiStatus, FaqTable, HistoryAppend, HistoryDelete, HistoryPage, LogRecord, QueryReply,
    QueryRequest,
};

/// Thin wrapper over a shared [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token_header: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| CampusError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_header: config.token_header.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the session token header when a token is present.
    fn authed(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => request.header(self.token_header.as_str(), token),
            _ => request,
        }
    }

    pub(crate) fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        self.authed(self.client.get(self.url(path)), token)
    }

    pub(crate) fn post(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        self.authed(self.client.post(self.url(path)), token)
    }

    fn delete(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        self.authed(self.client.delete(self.url(path)), token)
    }

    /// Send `request` and return the raw body of a successful reply.
    ///
    /// `fallback` is the error text used when a failed reply carries none.
    async fn call_text(&self, request: RequestBuilder, fallback: &str) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| CampusError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CampusError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "API response");

        let value = parse_body(&body);

        if !status.is_success() {
            let message = error_text(&value)
                .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
                .unwrap_or_else(|| fallback.to_string());
            return Err(CampusError::server(status.as_u16(), message));
        }
        if value.get("ok") == Some(&Value::Bool(false)) {
            let message = error_text(&value).unwrap_or_else(|| fallback.to_string());
            return Err(CampusError::server(status.as_u16(), message));
        }
        Ok(body)
    }

    /// Send `request` and return the parsed body of a successful reply.
    pub(crate) async fn call(&self, request: RequestBuilder, fallback: &str) -> Result<Value> {
        let body = self.call_text(request, fallback).await?;
        Ok(parse_body(&body))
    }

    /// Send `request` and deserialize a successful reply as `T`.
    ///
    /// Decodes straight from the body text so map order survives.
    pub(crate) async fn call_as<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let body = self.call_text(request, fallback).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Parse a body as JSON, keeping non-JSON text as a plain string value.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.trim().to_string()))
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[derive(Deserialize)]
struct FaqReply {
    faq: FaqTable,
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn offline_faq(&self) -> Result<FaqTable> {
        let reply: FaqReply = self
            .call_as(self.get("/api/offline_faq", None), "Offline FAQ unavailable")
            .await?;
        Ok(reply.faq)
    }

    async fn query(&self, token: Option<&str>, request: &QueryRequest) -> Result<QueryReply> {
        self.call_as(
            self.post("/api/query", token).json(request),
            "Unable to process query",
        )
        .await
    }

    async fn append_history(&self, token: Option<&str>, record: &HistoryAppend) -> Result<()> {
        self.call(
            self.post("/api/history", token).json(record),
            "History append failed",
        )
        .await?;
        Ok(())
    }

    async fn fetch_history(
        &self,
        token: Option<&str>,
        user: &str,
        page: u32,
        size: u32,
    ) -> Result<HistoryPage> {
        let request = self.get("/api/history", token).query(&[
            ("user", user.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ]);
        let mut fetched: HistoryPage = self.call_as(request, "Failed to load history").await?;
        if fetched.page == 0 {
            fetched.page = page;
        }
        if fetched.size == 0 {
            fetched.size = size;
        }
        Ok(fetched)
    }

    async fn delete_history(&self, token: Option<&str>, request: &HistoryDelete) -> Result<()> {
        self.call(
            self.delete("/api/history", token).json(request),
            "Failed to delete history",
        )
        .await?;
        Ok(())
    }

    async fn write_log(&self, token: Option<&str>, record: &LogRecord) -> Result<()> {
        self.call(self.post("/api/logs", token).json(record), "Log write failed")
            .await?;
        Ok(())
    }

    async fn status(&self, token: Option<&str>) -> Result<AiStatus> {
        let status: AiStatus = self
            .call_as(self.get("/api/status", token), "Status unavailable")
            .await?;
        if status.ai_provider_available == Some(false) && status.allow_external_queries {
            warn!("External queries allowed but no AI provider is available");
        }
        Ok(status)
    }
}
