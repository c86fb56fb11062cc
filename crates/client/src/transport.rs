//! Wire transport seam.

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;

use crate::{ApiRequest, ApiResponse, Method};

/// No response was received (DNS, connect, TLS, body read, ...).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes fully decorated requests. Auth and retry live above this seam.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// `reqwest`-backed transport against a single base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    client: reqwest::Client,
    /// Cookie-carrying client for requests that ask for credentials.
    credentialed: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let credentialed = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            credentialed,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// JSON body, or `{ "message": <text> }` for anything that is not JSON.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text }))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let client = if request.with_credentials {
            &self.credentialed
        } else {
            &self.client
        };

        let mut builder = client.request(reqwest_method(request.method), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(ApiResponse::new(status, parse_body(&text)))
    }
}
