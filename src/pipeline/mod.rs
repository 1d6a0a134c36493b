//! Pipeline entry points for harvester operations.
//!
//! - `run_harvest`: Drain the index and enrich every exhibitor
//! - `write_csv`: Export harvested records

pub mod export;
pub mod harvest;

use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;
use crate::utils::{ReqwestTransport, http};

pub use export::{ExportSummary, render_csv, write_csv};
pub use harvest::{HarvestOutcome, HarvestStats, PaginationDriver, StopReason};

/// Run a harvest against the live index.
pub async fn run_harvest(config: &Config) -> Result<HarvestOutcome> {
    let index = ReqwestTransport::new(http::create_index_client(&config.index)?);
    let pages = ReqwestTransport::new(http::create_page_client(&config.contact)?);

    log::info!(
        "Harvesting index '{}' from page {}",
        config.index.index_name,
        config.harvest.start_page
    );

    let driver = PaginationDriver::from_config(config, Arc::new(index), Arc::new(pages))?;
    driver.run().await
}
