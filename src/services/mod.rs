//! Service layer for the harvester.
//!
//! This module contains the business logic for:
//! - Index page fetching with retry (`PageFetcher`)
//! - Contact scraping from exhibitor pages (`ContactScraper`)
//! - Record normalization and enrichment (`RecordEnricher`)

mod contacts;
mod enricher;
mod index;

pub use contacts::{ContactScraper, ScrapeOutcome};
pub use enricher::RecordEnricher;
pub use index::{PageFetcher, PageOutcome};
