// src/pipeline/harvest.rs

//! Pagination driver.
//!
//! Walks the index page by page, enriching every hit, until a page comes
//! back empty or a configured safety bound is reached. Pages that fail
//! every retry are skipped and reported in the outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Config, ExhibitorRecord, HarvestConfig, RawHit};
use crate::services::{ContactScraper, PageFetcher, PageOutcome, RecordEnricher};
use crate::utils::Transport;

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The given page returned no hits
    EmptyPage(u32),
    /// `max_pages` was reached before the given page
    PageLimit(u32),
    /// `max_consecutive_skips` was reached at the given page
    TooManyFailures(u32),
}

/// Counters for a harvest run.
#[derive(Debug, Clone)]
pub struct HarvestStats {
    pub start_page: u32,
    /// Pages whose hits were accumulated
    pub pages_fetched: u32,
    /// Requests sent to the index, retries included
    pub requests: u32,
    pub stop: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl HarvestStats {
    pub fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Result of a harvest run.
#[derive(Debug, Clone)]
pub enum HarvestOutcome {
    /// Every visited page was read
    Completed {
        records: Vec<ExhibitorRecord>,
        stats: HarvestStats,
    },
    /// Some pages were dropped after exhausting their retries
    PartiallyCompleted {
        records: Vec<ExhibitorRecord>,
        skipped_pages: Vec<u32>,
        stats: HarvestStats,
    },
}

impl HarvestOutcome {
    pub fn records(&self) -> &[ExhibitorRecord] {
        match self {
            HarvestOutcome::Completed { records, .. }
            | HarvestOutcome::PartiallyCompleted { records, .. } => records,
        }
    }

    pub fn stats(&self) -> &HarvestStats {
        match self {
            HarvestOutcome::Completed { stats, .. }
            | HarvestOutcome::PartiallyCompleted { stats, .. } => stats,
        }
    }

    pub fn skipped_pages(&self) -> &[u32] {
        match self {
            HarvestOutcome::Completed { .. } => &[],
            HarvestOutcome::PartiallyCompleted { skipped_pages, .. } => skipped_pages.as_slice(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, HarvestOutcome::Completed { .. })
    }

    /// Records of a complete run, or [`AppError::Incomplete`].
    pub fn into_complete(self) -> Result<Vec<ExhibitorRecord>> {
        match self {
            HarvestOutcome::Completed { records, .. } => Ok(records),
            HarvestOutcome::PartiallyCompleted { skipped_pages, .. } => Err(AppError::Incomplete {
                skipped: skipped_pages,
            }),
        }
    }
}

enum DriverState {
    Fetching(u32),
    Accumulating { page: u32, hits: Vec<RawHit> },
    Skipping(u32),
    Done(StopReason),
}

/// Drains the index one page at a time.
pub struct PaginationDriver {
    fetcher: PageFetcher,
    enricher: RecordEnricher,
    settings: HarvestConfig,
}

impl PaginationDriver {
    pub fn new(fetcher: PageFetcher, enricher: RecordEnricher, settings: HarvestConfig) -> Self {
        Self {
            fetcher,
            enricher,
            settings,
        }
    }

    /// Wire a driver from configuration and the two transports.
    pub fn from_config(
        config: &Config,
        index_transport: Arc<dyn Transport>,
        page_transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let fetcher = PageFetcher::new(
            index_transport,
            config.index.clone(),
            config.harvest.retry_delay(),
        )?;
        let scraper = ContactScraper::new(page_transport, &config.contact.rules)?;
        Ok(Self::new(
            fetcher,
            RecordEnricher::new(scraper),
            config.harvest.clone(),
        ))
    }

    /// Run until the index is drained or a safety bound stops the walk.
    ///
    /// Only an index response without `results[0].hits` aborts the run.
    pub async fn run(&self) -> Result<HarvestOutcome> {
        let started_at = Utc::now();
        let start_page = self.settings.start_page;
        let request_delay = self.settings.request_delay();

        let mut records = Vec::new();
        let mut skipped_pages = Vec::new();
        let mut visited = 0u32;
        let mut pages_fetched = 0u32;
        let mut consecutive_skips = 0u32;

        let mut state = DriverState::Fetching(start_page);
        let stop = loop {
            state = match state {
                DriverState::Fetching(page) => {
                    if self.settings.max_pages.is_some_and(|limit| visited >= limit) {
                        log::warn!("Page limit reached; not requesting page {}", page);
                        DriverState::Done(StopReason::PageLimit(page))
                    } else {
                        visited += 1;
                        match self.fetcher.fetch(page, self.settings.max_retries).await? {
                            PageOutcome::Hits(hits) => DriverState::Accumulating { page, hits },
                            PageOutcome::Empty => DriverState::Done(StopReason::EmptyPage(page)),
                            PageOutcome::Skipped { .. } => DriverState::Skipping(page),
                        }
                    }
                }
                DriverState::Accumulating { page, hits } => {
                    for hit in &hits {
                        records.push(self.enricher.enrich(hit).await);
                    }
                    pages_fetched += 1;
                    consecutive_skips = 0;
                    log::info!(
                        "Page {} processed successfully with {} exhibitors.",
                        page,
                        hits.len()
                    );

                    if !request_delay.is_zero() {
                        tokio::time::sleep(request_delay).await;
                    }
                    DriverState::Fetching(page + 1)
                }
                DriverState::Skipping(page) => {
                    skipped_pages.push(page);
                    consecutive_skips += 1;
                    if self
                        .settings
                        .max_consecutive_skips
                        .is_some_and(|limit| consecutive_skips >= limit)
                    {
                        log::error!(
                            "{} consecutive pages failed; giving up at page {}",
                            consecutive_skips,
                            page
                        );
                        DriverState::Done(StopReason::TooManyFailures(page))
                    } else {
                        DriverState::Fetching(page + 1)
                    }
                }
                DriverState::Done(reason) => break reason,
            };
        };

        let stats = HarvestStats {
            start_page,
            pages_fetched,
            requests: self.fetcher.requests_sent(),
            stop,
            started_at,
            finished_at: Utc::now(),
        };

        if skipped_pages.is_empty() {
            Ok(HarvestOutcome::Completed { records, stats })
        } else {
            log::warn!(
                "{} page(s) skipped after retries: {:?}",
                skipped_pages.len(),
                skipped_pages
            );
            Ok(HarvestOutcome::PartiallyCompleted {
                records,
                skipped_pages,
                stats,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{Scripted, ScriptedTransport};

    fn config() -> Config {
        let mut config = Config::default();
        config.harvest.retry_delay_ms = 0;
        config.harvest.request_delay_ms = 0;
        config
    }

    fn driver(config: &Config, index: Arc<ScriptedTransport>) -> PaginationDriver {
        PaginationDriver::from_config(config, index, Arc::new(ScriptedTransport::new())).unwrap()
    }

    fn requested_pages(transport: &ScriptedTransport) -> Vec<u32> {
        transport
            .post_bodies()
            .iter()
            .map(|body| {
                let value: serde_json::Value = serde_json::from_str(body).unwrap();
                let params = value["requests"][0]["params"].as_str().unwrap().to_string();
                url::form_urlencoded::parse(params.as_bytes())
                    .find(|(k, _)| k == "page")
                    .map(|(_, v)| v.parse().unwrap())
                    .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_full_page_then_empty() {
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 24),
            Scripted::empty(),
        ]));
        let outcome = driver(&config(), Arc::clone(&index)).run().await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.records().len(), 24);
        assert_eq!(outcome.stats().requests, 2);
        assert_eq!(outcome.stats().stop, StopReason::EmptyPage(1));
        assert_eq!(requested_pages(&index), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_record_count_is_sum_of_hits() {
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 24),
            Scripted::hits(1, 24),
            Scripted::hits(2, 7),
            Scripted::empty(),
            Scripted::hits(4, 24),
        ]));
        let outcome = driver(&config(), Arc::clone(&index)).run().await.unwrap();

        assert_eq!(outcome.records().len(), 55);
        assert_eq!(outcome.stats().pages_fetched, 3);
        // nothing is requested after the empty page
        assert_eq!(requested_pages(&index), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_records_keep_page_and_hit_order() {
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 2),
            Scripted::hits(1, 2),
        ]));
        let outcome = driver(&config(), index).run().await.unwrap();

        let ids: Vec<&str> = outcome
            .records()
            .iter()
            .map(|r| r.id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["0-0", "0-1", "1-0", "1-1"]);
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped_and_reported() {
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 24),
            Scripted::status(500),
            Scripted::status(500),
            Scripted::Fail("connection reset".into()),
            Scripted::hits(2, 10),
            Scripted::empty(),
        ]));
        let outcome = driver(&config(), Arc::clone(&index)).run().await.unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(outcome.skipped_pages(), &[1]);
        assert_eq!(outcome.records().len(), 34);
        assert_eq!(outcome.stats().requests, 6);
        assert_eq!(requested_pages(&index), vec![0, 1, 1, 1, 2, 3]);
        assert!(matches!(
            outcome.into_complete(),
            Err(AppError::Incomplete { skipped }) if skipped == vec![1]
        ));
    }

    #[tokio::test]
    async fn test_starts_from_configured_page() {
        let mut config = config();
        config.harvest.start_page = 5;
        let index = Arc::new(ScriptedTransport::with_posts([Scripted::hits(5, 3)]));
        let outcome = driver(&config, Arc::clone(&index)).run().await.unwrap();

        assert_eq!(outcome.records().len(), 3);
        assert_eq!(requested_pages(&index), vec![5, 6]);
    }

    #[tokio::test]
    async fn test_page_limit_bounds_the_walk() {
        let mut config = config();
        config.harvest.max_pages = Some(2);
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 24),
            Scripted::hits(1, 24),
            Scripted::hits(2, 24),
        ]));
        let outcome = driver(&config, Arc::clone(&index)).run().await.unwrap();

        assert_eq!(outcome.records().len(), 48);
        assert_eq!(outcome.stats().stop, StopReason::PageLimit(2));
        assert_eq!(requested_pages(&index), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_consecutive_skip_limit() {
        let mut config = config();
        config.harvest.max_retries = 1;
        config.harvest.max_consecutive_skips = Some(2);
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 1),
            Scripted::status(503),
            Scripted::status(503),
            Scripted::hits(3, 1),
        ]));
        let outcome = driver(&config, Arc::clone(&index)).run().await.unwrap();

        assert_eq!(outcome.skipped_pages(), &[1, 2]);
        assert_eq!(outcome.stats().stop, StopReason::TooManyFailures(2));
        assert_eq!(outcome.records().len(), 1);
    }

    #[tokio::test]
    async fn test_non_json_body_is_retried_then_skipped() {
        let busy = || Scripted::Reply(crate::utils::HttpReply::new(200, "<html>busy</html>"));
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 24),
            busy(),
            busy(),
            busy(),
            Scripted::hits(2, 24),
            Scripted::empty(),
        ]));
        let outcome = driver(&config(), Arc::clone(&index)).run().await.unwrap();

        assert_eq!(outcome.records().len(), 48);
        assert_eq!(outcome.skipped_pages(), &[1]);
        assert_eq!(requested_pages(&index), vec![0, 1, 1, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_transient_non_json_body_recovers() {
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 24),
            Scripted::Reply(crate::utils::HttpReply::new(200, "<html>busy</html>")),
            Scripted::hits(1, 24),
            Scripted::empty(),
        ]));
        let outcome = driver(&config(), index).run().await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.records().len(), 48);
    }

    #[tokio::test]
    async fn test_json_without_hits_aborts() {
        let index = Arc::new(ScriptedTransport::with_posts([
            Scripted::hits(0, 2),
            Scripted::json(serde_json::json!({ "results": [{ "nbHits": 0 }] })),
        ]));
        let result = driver(&config(), index).run().await;

        assert!(matches!(
            result,
            Err(AppError::ResponseShape { page: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_contact_failures_do_not_abort_page() {
        let page = r#"<a href="mailto:a@b.test"><i class="fa-solid fa-envelope mr-2"></i></a>"#;
        let pages = Arc::new(
            ScriptedTransport::new()
                .page("https://exhibitors.test/0/0", Scripted::html(page))
                .page("https://exhibitors.test/0/1", Scripted::status(500))
                .page("https://exhibitors.test/0/2", Scripted::Fail("tls".into())),
        );
        let index = Arc::new(ScriptedTransport::with_posts([Scripted::hits(0, 3)]));
        let outcome = PaginationDriver::from_config(&config(), index, pages.clone())
            .unwrap()
            .run()
            .await
            .unwrap();

        let records = outcome.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].contact.email.as_deref(), Some("a@b.test"));
        assert!(records[1].contact.is_empty());
        assert!(records[2].contact.is_empty());
        assert_eq!(pages.get_urls().len(), 3);
    }
}
