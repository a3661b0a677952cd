//! HTTP GET plumbing shared by the geocoder and the forecast client.
//!
//! The layers compose by wrapping: the forecast client talks to
//! `CachingTransport<RetryingTransport<HttpTransport>>`, so a fresh cache hit
//! never reaches the retry loop or the network.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};

use crate::error::TransportError;

pub mod cache;
pub mod retry;

pub use cache::{CacheEntry, CacheStore, CachingTransport, FileCache, MemoryCache};
pub use retry::RetryingTransport;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// An idempotent GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Stable identity of the request: URL plus query parameters in sorted order.
    /// Headers are not part of the key.
    pub fn cache_key(&self) -> String {
        let mut params = self.query.clone();
        params.sort();

        match Url::parse_with_params(&self.url, &params) {
            Ok(url) => url.to_string(),
            Err(_) => {
                let joined: Vec<String> =
                    params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{}?{}", self.url, joined.join("&"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).get(request).await
    }
}

/// Plain reqwest transport: one request per call, no retry, no cache.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.http.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(url = %request.url, "sending GET");

        let res = builder.send().await.map_err(|source| TransportError::Request {
            url: request.url.clone(),
            source,
        })?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|source| TransportError::Read {
            url: request.url.clone(),
            source,
        })?;

        tracing::debug!(url = %request.url, status, bytes = body.len(), "received response");

        Ok(HttpResponse { status, body })
    }
}

/// Shorten a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
