// src/utils/http.rs

//! HTTP client utilities.
//!
//! Services talk to the network through [`Transport`] so that retry and
//! fail-closed behavior can be exercised without a live server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::{ContactConfig, IndexConfig};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Anything below 400 counts as OK.
    pub fn is_ok(&self) -> bool {
        self.status < 400
    }
}

/// Minimal request surface used by the services.
///
/// An `Err` means the exchange did not complete (DNS, TLS, timeout, reset);
/// an error status is still an `Ok(HttpReply)`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpReply>;

    async fn post(&self, url: &str, body: String) -> Result<HttpReply>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn exchange(url: &str, request: reqwest::RequestBuilder) -> Result<HttpReply> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpReply> {
        Self::exchange(url, self.client.get(url)).await
    }

    async fn post(&self, url: &str, body: String) -> Result<HttpReply> {
        Self::exchange(url, self.client.post(url).body(body)).await
    }
}

/// Create the client used for search index queries.
pub fn create_index_client(config: &IndexConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    insert_header(&mut headers, header::ORIGIN, &config.origin)?;
    insert_header(&mut headers, header::REFERER, &config.referer)?;
    insert_header(&mut headers, header::CONTENT_TYPE, &config.content_type)?;

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Create the client used for exhibitor webpages.
pub fn create_page_client(config: &ContactConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    insert_header(&mut headers, header::ACCEPT_LANGUAGE, &config.accept_language)?;

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    let value = HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("invalid {name} header: {e}")))?;
    headers.insert(name, value);
    Ok(())
}
