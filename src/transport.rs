//! HTTP transport used by the batch orchestrator
//!
//! The orchestrator only depends on the [`Transport`] trait, so tests and
//! embedders can substitute their own implementation. [`HttpTransport`] is
//! the default, backed by `reqwest`.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use url::Url;

/// One HTTP request produced by a task function
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Absolute request URL
    pub url: String,

    /// HTTP method (default: "GET")
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers; when absent `Content-Type: application/json` is sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// JSON body, sent serialized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RequestDescriptor {
    /// A GET request without explicit headers
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: None,
            body: None,
        }
    }

    /// Replace the HTTP method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A successful (2xx) response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportResponse {
    /// Parsed JSON body, or the body text as a JSON string
    pub data: Value,
    /// HTTP status code
    pub status: u16,
}

/// Performs one request exchange
///
/// Implementations must stop work and return [`Error::Aborted`] once
/// `cancel` fires. Non-2xx responses are reported as [`Error::Http`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and wait for its response
    async fn send(
        &self,
        request: RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("oh-no-again/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        let url = Url::parse(&request.url)?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            Error::InvalidArgument(format!("invalid HTTP method '{}'", request.method))
        })?;

        tracing::debug!(method = %method, url = %url, "sending request");

        let mut builder = self
            .client
            .request(method, url)
            .headers(build_headers(request.headers.as_ref())?);
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_string(body)?);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let data = if is_json {
            response.json::<Value>().await?
        } else {
            Value::String(response.text().await?)
        };

        Ok(TransportResponse {
            data,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<TransportResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Aborted),
            result = self.execute(request) => result,
        }
    }
}

/// Convert descriptor headers, defaulting to a JSON content type
fn build_headers(headers: Option<&HashMap<String, String>>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();

    let Some(headers) = headers else {
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        return Ok(map);
    };

    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidArgument(format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidArgument(format!("invalid value for header '{name}'")))?;
        map.insert(name, value);
    }

    Ok(map)
}
