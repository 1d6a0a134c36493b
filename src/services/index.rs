// src/services/index.rs

//! Search index page fetcher.
//!
//! Issues one multi-query request per page against the index and retries
//! transient failures with a fixed delay.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{IndexConfig, RawHit};
use crate::utils::Transport;

/// What a single page request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The page carried at least one hit
    Hits(Vec<RawHit>),
    /// The index returned an empty page: the result set is drained
    Empty,
    /// Every attempt failed; the caller should move on to the next page
    Skipped { attempts: u32, last_error: String },
}

#[derive(Serialize)]
struct MultiQuery<'a> {
    requests: [IndexQuery<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexQuery<'a> {
    index_name: &'a str,
    params: String,
}

#[derive(Deserialize)]
struct MultiResponse {
    results: Vec<QueryResult>,
}

#[derive(Deserialize)]
struct QueryResult {
    hits: Vec<RawHit>,
}

/// Fetches pages of hits from the search index.
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    config: IndexConfig,
    query_url: String,
    retry_delay: Duration,
    requests: AtomicU32,
}

impl PageFetcher {
    /// Create a fetcher; fails if the endpoint is not a valid URL.
    pub fn new(
        transport: Arc<dyn Transport>,
        config: IndexConfig,
        retry_delay: Duration,
    ) -> Result<Self> {
        let query_url = Self::build_query_url(&config)?;
        Ok(Self {
            transport,
            config,
            query_url,
            retry_delay,
            requests: AtomicU32::new(0),
        })
    }

    /// Number of HTTP requests issued so far, retries included.
    pub fn requests_sent(&self) -> u32 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Fetch one page, trying at most `max_retries` times.
    ///
    /// A body that is not JSON counts as a failed attempt. JSON without
    /// `results[0].hits` is returned as [`AppError::ResponseShape`] and is
    /// not retried.
    pub async fn fetch(&self, page: u32, max_retries: u32) -> Result<PageOutcome> {
        let body = self.request_body(page)?;
        let mut last_error = String::new();

        for attempt in 1..=max_retries {
            self.requests.fetch_add(1, Ordering::Relaxed);

            match self.transport.post(&self.query_url, body.clone()).await {
                Ok(reply) if reply.is_ok() => {
                    let value: serde_json::Value = match serde_json::from_str(&reply.body) {
                        Ok(value) => value,
                        Err(e) => {
                            log::warn!(
                                "Unreadable body on page {}, attempt {}/{}: {}",
                                page,
                                attempt,
                                max_retries,
                                e
                            );
                            last_error = format!("invalid JSON: {e}");
                            self.pause().await;
                            continue;
                        }
                    };
                    let hits = Self::parse_hits(page, value)?;
                    if hits.is_empty() {
                        log::info!("No more results found. Stopping at page {}.", page);
                        return Ok(PageOutcome::Empty);
                    }
                    log::debug!("Page {} returned {} hits", page, hits.len());
                    return Ok(PageOutcome::Hits(hits));
                }
                Ok(reply) => {
                    log::warn!(
                        "Failed request on page {}, attempt {}/{}. Status code: {}",
                        page,
                        attempt,
                        max_retries,
                        reply.status
                    );
                    last_error = format!("status {}", reply.status);
                }
                Err(e) => {
                    log::warn!(
                        "Request error on page {}, attempt {}/{}: {}",
                        page,
                        attempt,
                        max_retries,
                        e
                    );
                    last_error = e.to_string();
                }
            }

            self.pause().await;
        }

        log::warn!("Max retries reached for page {}. Skipping...", page);
        Ok(PageOutcome::Skipped {
            attempts: max_retries,
            last_error,
        })
    }

    fn build_query_url(config: &IndexConfig) -> Result<String> {
        let url = Url::parse_with_params(
            &config.endpoint,
            &[
                ("x-algolia-agent", config.agent.as_str()),
                ("x-algolia-api-key", config.api_key.as_str()),
                ("x-algolia-application-id", config.application_id.as_str()),
            ],
        )?;
        Ok(url.into())
    }

    /// Encode the query parameters for a page. Only `page` varies.
    fn query_params(&self, page: u32) -> Result<String> {
        let facets = serde_json::to_string(&self.config.facets)?;
        let params = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("clickAnalytics", &self.config.click_analytics.to_string())
            .append_pair("facets", &facets)
            .append_pair("highlightPostTag", &self.config.highlight_post_tag)
            .append_pair("highlightPreTag", &self.config.highlight_pre_tag)
            .append_pair("hitsPerPage", &self.config.hits_per_page.to_string())
            .append_pair(
                "maxValuesPerFacet",
                &self.config.max_values_per_facet.to_string(),
            )
            .append_pair("page", &page.to_string())
            .append_pair("query", "")
            .append_pair("userToken", &self.config.user_token)
            .finish();
        Ok(params)
    }

    fn request_body(&self, page: u32) -> Result<String> {
        let query = MultiQuery {
            requests: [IndexQuery {
                index_name: &self.config.index_name,
                params: self.query_params(page)?,
            }],
        };
        Ok(serde_json::to_string(&query)?)
    }

    async fn pause(&self) {
        if !self.retry_delay.is_zero() {
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    fn parse_hits(page: u32, body: serde_json::Value) -> Result<Vec<RawHit>> {
        let response: MultiResponse =
            serde_json::from_value(body).map_err(|e| AppError::response_shape(page, e))?;
        response
            .results
            .into_iter()
            .next()
            .map(|result| result.hits)
            .ok_or_else(|| AppError::response_shape(page, "empty results array"))
    }
}
