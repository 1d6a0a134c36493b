// src/services/enricher.rs

//! Maps raw index hits to exhibitor records and attaches contact details.

use crate::models::{ExhibitorRecord, RawHit};
use crate::services::ContactScraper;

/// Builds [`ExhibitorRecord`]s from raw hits.
pub struct RecordEnricher {
    scraper: ContactScraper,
}

impl RecordEnricher {
    pub fn new(scraper: ContactScraper) -> Self {
        Self { scraper }
    }

    /// Read the index-derived fields of a hit. Missing keys become `None`.
    pub fn normalize(hit: &RawHit) -> ExhibitorRecord {
        ExhibitorRecord {
            id: hit.text("externalId"),
            name: hit.text("name"),
            interests: hit.list("interests"),
            url: hit.text("url"),
            country: hit.text("country"),
            is_startup: hit.flag("startUp"),
            stage: hit.text("stage"),
            founding: hit.text("foundingYear"),
            contact: Default::default(),
        }
    }

    /// Normalize a hit and scrape its webpage for contact details.
    ///
    /// The scrape always runs, even without a URL, and a failed scrape leaves
    /// every contact field empty.
    pub async fn enrich(&self, hit: &RawHit) -> ExhibitorRecord {
        let mut record = Self::normalize(hit);
        let url = record.url.as_deref().unwrap_or_default();
        record.contact = self.scraper.scrape(url).await.into_contact();
        record
    }
}
