// src/services/contacts.rs

//! Contact scraper.
//!
//! Fetches an exhibitor's page once and reads the href of the link that
//! encloses each configured marker icon.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ContactInfo, ContactRule, ContactRuleSet};
use crate::utils::Transport;

/// Result of one scrape attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// The page was fetched; fields without a usable marker are `None`
    Found(ContactInfo),
    /// The page could not be fetched
    Unavailable { reason: String },
}

impl ScrapeOutcome {
    /// Collapse to contact details; an unavailable page yields all `None`.
    pub fn into_contact(self) -> ContactInfo {
        match self {
            ScrapeOutcome::Found(contact) => contact,
            ScrapeOutcome::Unavailable { .. } => ContactInfo::default(),
        }
    }
}

/// Scrapes contact links from exhibitor pages.
pub struct ContactScraper {
    transport: Arc<dyn Transport>,
    rules: Vec<(ContactRule, Selector)>,
}

impl ContactScraper {
    /// Create a scraper for a rule set; fails on an unusable marker tag.
    pub fn new(transport: Arc<dyn Transport>, rule_set: &ContactRuleSet) -> Result<Self> {
        let rules = rule_set
            .rules
            .iter()
            .map(|rule| {
                let selector = Self::parse_selector(&format!("{}[class]", rule.marker_tag))?;
                Ok((rule.clone(), selector))
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Contact rules '{}' loaded ({} markers)",
            rule_set.version,
            rules.len()
        );
        Ok(Self { transport, rules })
    }

    /// Fetch `url` and extract contact details. Never returns an error.
    pub async fn scrape(&self, url: &str) -> ScrapeOutcome {
        if url.trim().is_empty() {
            log::debug!("Exhibitor has no URL; skipping contact scrape");
            return ScrapeOutcome::Unavailable {
                reason: "no url".to_string(),
            };
        }

        match self.transport.get(url).await {
            Ok(reply) if reply.is_ok() => ScrapeOutcome::Found(self.extract(&reply.body)),
            Ok(reply) => {
                log::warn!("Contact page {} returned status {}", url, reply.status);
                ScrapeOutcome::Unavailable {
                    reason: format!("status {}", reply.status),
                }
            }
            Err(e) => {
                log::warn!("Contact page {} could not be fetched: {}", url, e);
                ScrapeOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Extract contact details from an HTML document.
    ///
    /// Each rule is applied independently; only the first marker matching a
    /// rule is considered.
    pub fn extract(&self, html: &str) -> ContactInfo {
        let document = Html::parse_document(html);
        let mut contact = ContactInfo::default();

        for (rule, selector) in &self.rules {
            let value = Self::find_marker(&document, selector, rule)
                .and_then(Self::enclosing_href)
                .filter(|href| rule.strip_prefix.is_none() || !href.is_empty())
                .map(|href| rule.clean(href));
            contact.set(rule.field, value);
        }
        contact
    }

    fn find_marker<'a>(
        document: &'a Html,
        selector: &Selector,
        rule: &ContactRule,
    ) -> Option<ElementRef<'a>> {
        document.select(selector).find(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| rule.matches_class(class))
        })
    }

    /// The `href` of the nearest `<a>` ancestor, if any.
    fn enclosing_href<'a>(marker: ElementRef<'a>) -> Option<&'a str> {
        marker
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a")
            .and_then(|a| a.value().attr("href"))
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
