//! Exhibitor Harvester CLI
//!
//! Drains the exhibitor index, scrapes contact details and writes a CSV.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use harvester::{
    error::{AppError, Result},
    models::Config,
    pipeline,
};

/// Exhibitor Harvester - search index to CSV
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Harvest exhibitor listings and contact details"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every page, enrich records and export them
    Harvest {
        /// CSV output path (default: output.path from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// First page to request
        #[arg(long)]
        start_page: Option<u32>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Fail if any page was skipped (the export is still written)
        #[arg(long)]
        strict: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Harvest {
            output,
            start_page,
            max_pages,
            strict,
        } => {
            let mut config = Config::load_or_default(&cli.config);
            log::debug!("Loaded configuration from {}", cli.config.display());

            if let Some(page) = start_page {
                config.harvest.start_page = page;
            }
            if max_pages.is_some() {
                config.harvest.max_pages = max_pages;
            }
            if let Some(path) = output {
                config.output.path = path.display().to_string();
            }
            config.validate()?;

            let outcome = pipeline::run_harvest(&config).await?;
            let stats = outcome.stats();

            log::info!(
                "Harvested {} exhibitors from {} pages ({} requests, {}s, stop: {:?})",
                outcome.records().len(),
                stats.pages_fetched,
                stats.requests,
                stats.elapsed_secs(),
                stats.stop
            );

            let summary = pipeline::write_csv(&config.output.path, outcome.records()).await?;
            log::info!(
                "Data saved to {} ({} rows)",
                summary.path.display(),
                summary.rows
            );

            if !outcome.is_complete() {
                log::warn!(
                    "Skipped pages: {:?}. Re-run with --start-page to recover them.",
                    outcome.skipped_pages()
                );
                if strict {
                    return Err(AppError::Incomplete {
                        skipped: outcome.skipped_pages().to_vec(),
                    });
                }
            }
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            let config = Config::load(&cli.config).inspect_err(|e| {
                log::error!("Config load failed: {}", e);
            })?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK (index '{}', {} contact rules, version '{}')",
                config.index.index_name,
                config.contact.rules.rules.len(),
                config.contact.rules.version
            );
        }
    }

    Ok(())
}
