//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ContactRuleSet;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Search index endpoint and query template
    #[serde(default)]
    pub index: IndexConfig,

    /// Pagination, retry and throttling behavior
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Exhibitor webpage scraping settings
    #[serde(default)]
    pub contact: ContactConfig,

    /// Export destination
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.index.endpoint.trim().is_empty() {
            return Err(AppError::validation("index.endpoint is empty"));
        }
        if self.index.index_name.trim().is_empty() {
            return Err(AppError::validation("index.index_name is empty"));
        }
        if self.index.hits_per_page == 0 {
            return Err(AppError::validation("index.hits_per_page must be > 0"));
        }
        if self.index.timeout_secs == 0 {
            return Err(AppError::validation("index.timeout_secs must be > 0"));
        }
        if self.harvest.max_retries == 0 {
            return Err(AppError::validation("harvest.max_retries must be > 0"));
        }
        if self.harvest.max_pages == Some(0) {
            return Err(AppError::validation("harvest.max_pages must be > 0 when set"));
        }
        if self.harvest.max_consecutive_skips == Some(0) {
            return Err(AppError::validation(
                "harvest.max_consecutive_skips must be > 0 when set",
            ));
        }
        if self.contact.timeout_secs == 0 {
            return Err(AppError::validation("contact.timeout_secs must be > 0"));
        }
        if self.contact.user_agent.trim().is_empty() {
            return Err(AppError::validation("contact.user_agent is empty"));
        }

        let mut seen = HashSet::new();
        for rule in &self.contact.rules.rules {
            if rule.marker_class.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "contact rule for {} has an empty marker class",
                    rule.field
                )));
            }
            if !seen.insert(rule.field) {
                return Err(AppError::validation(format!(
                    "contact rule for {} is defined more than once",
                    rule.field
                )));
            }
        }

        if self.output.path.trim().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        Ok(())
    }
}

/// Search index endpoint, credentials and the fixed query parameters.
///
/// Credentials travel as query-string parameters and are opaque to the
/// harvester; only the page cursor varies between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Multi-query endpoint URL (without query string)
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    #[serde(default = "defaults::application_id")]
    pub application_id: String,

    #[serde(default = "defaults::api_key")]
    pub api_key: String,

    /// Client agent string sent as `x-algolia-agent`
    #[serde(default = "defaults::agent")]
    pub agent: String,

    #[serde(default = "defaults::index_name")]
    pub index_name: String,

    #[serde(default = "defaults::hits_per_page")]
    pub hits_per_page: u32,

    /// Attributes requested as facets
    #[serde(default = "defaults::facets")]
    pub facets: Vec<String>,

    #[serde(default = "defaults::max_values_per_facet")]
    pub max_values_per_facet: u32,

    #[serde(default = "defaults::enabled")]
    pub click_analytics: bool,

    #[serde(default = "defaults::user_token")]
    pub user_token: String,

    #[serde(default = "defaults::highlight_pre_tag")]
    pub highlight_pre_tag: String,

    #[serde(default = "defaults::highlight_post_tag")]
    pub highlight_post_tag: String,

    /// `Origin` header expected by the index
    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// `Referer` header expected by the index
    #[serde(default = "defaults::referer")]
    pub referer: String,

    #[serde(default = "defaults::index_content_type")]
    pub content_type: String,

    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            application_id: defaults::application_id(),
            api_key: defaults::api_key(),
            agent: defaults::agent(),
            index_name: defaults::index_name(),
            hits_per_page: defaults::hits_per_page(),
            facets: defaults::facets(),
            max_values_per_facet: defaults::max_values_per_facet(),
            click_analytics: defaults::enabled(),
            user_token: defaults::user_token(),
            highlight_pre_tag: defaults::highlight_pre_tag(),
            highlight_post_tag: defaults::highlight_post_tag(),
            origin: defaults::origin(),
            referer: defaults::referer(),
            content_type: defaults::index_content_type(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Pagination, retry and throttling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Zero-based page the harvest starts from
    #[serde(default)]
    pub start_page: u32,

    /// Attempts per page before the page is skipped
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Delay after a failed attempt in milliseconds
    #[serde(default = "defaults::delay")]
    pub retry_delay_ms: u64,

    /// Delay between successive page requests in milliseconds
    #[serde(default = "defaults::delay")]
    pub request_delay_ms: u64,

    /// Stop after this many pages have been visited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,

    /// Stop after this many pages in a row were skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_consecutive_skips: Option<u32>,
}

impl HarvestConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            start_page: 0,
            max_retries: defaults::max_retries(),
            retry_delay_ms: defaults::delay(),
            request_delay_ms: defaults::delay(),
            max_pages: None,
            max_consecutive_skips: None,
        }
    }
}

/// Exhibitor webpage scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Marker rules used to locate contact links
    #[serde(default)]
    pub rules: ContactRuleSet,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
            rules: ContactRuleSet::default(),
        }
    }
}

/// Export destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV file written at the end of a harvest
    #[serde(default = "defaults::output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
        }
    }
}

mod defaults {
    // Index defaults
    pub fn endpoint() -> String {
        "https://8vvb6vr33k-dsn.algolia.net/1/indexes/*/queries".into()
    }
    pub fn application_id() -> String {
        "8VVB6VR33K".into()
    }
    pub fn api_key() -> String {
        "00422c3d9f3484bccfae011262fcf49a".into()
    }
    pub fn agent() -> String {
        "Algolia for JavaScript (4.24.0); Browser (lite); instantsearch.js (4.75.5); \
         react (17.0.2); react-instantsearch (7.13.8); react-instantsearch-core (7.13.8); \
         JS Helper (3.22.5)"
            .into()
    }
    pub fn index_name() -> String {
        "exhibitors-default".into()
    }
    pub fn hits_per_page() -> u32 {
        24
    }
    pub fn facets() -> Vec<String> {
        ["attributes", "building", "externalId", "interests", "letter"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
    pub fn max_values_per_facet() -> u32 {
        500
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn user_token() -> String {
        "web".into()
    }
    pub fn highlight_pre_tag() -> String {
        "__ais-highlight__".into()
    }
    pub fn highlight_post_tag() -> String {
        "__/ais-highlight__".into()
    }
    pub fn origin() -> String {
        "https://www.mwcbarcelona.com".into()
    }
    pub fn referer() -> String {
        "https://www.mwcbarcelona.com/exhibitors".into()
    }
    pub fn index_content_type() -> String {
        "application/x-www-form-urlencoded".into()
    }

    // Shared HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "es-ES,es;q=0.9".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Harvest defaults
    pub fn max_retries() -> u32 {
        3
    }
    pub fn delay() -> u64 {
        200
    }

    // Output defaults
    pub fn output_path() -> String {
        "exhibitors_bcn.csv".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactField, ContactRule};

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_matches_index_contract() {
        let config = Config::default();
        assert_eq!(config.index.hits_per_page, 24);
        assert_eq!(config.harvest.start_page, 0);
        assert_eq!(config.harvest.max_retries, 3);
        assert!(config.harvest.max_pages.is_none());
    }

    #[test]
    fn validate_rejects_zero_retries() {
        let mut config = Config::default();
        config.harvest.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_limit() {
        let mut config = Config::default();
        config.harvest.max_pages = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_rule_fields() {
        let mut config = Config::default();
        config.contact.rules.rules.push(ContactRule {
            field: ContactField::Email,
            marker_tag: "i".into(),
            marker_class: "fa-regular fa-envelope".into(),
            strip_prefix: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [harvest]
            max_pages = 5
            request_delay_ms = 0

            [output]
            path = "out/exhibitors.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.harvest.max_pages, Some(5));
        assert_eq!(config.harvest.request_delay_ms, 0);
        assert_eq!(config.harvest.max_retries, 3);
        assert_eq!(config.index.index_name, "exhibitors-default");
        assert_eq!(config.contact.rules.rules.len(), 4);
        assert_eq!(config.output.path, "out/exhibitors.csv");
    }

    #[test]
    fn bundled_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.contact.rules.rules.len(), 4);
        assert_eq!(config.index.facets.len(), 5);
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.output.path, "exhibitors_bcn.csv");
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[harvest\nmax_retries = ").unwrap();

        assert!(matches!(Config::load(&path), Err(AppError::Toml(_))));
        assert!(matches!(
            Config::load(dir.path().join("missing.toml")),
            Err(AppError::Io(_))
        ));
    }
}
