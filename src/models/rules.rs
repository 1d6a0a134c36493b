// src/models/rules.rs

//! Marker rules for locating contact links on an exhibitor page.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Contact field a rule fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Email,
    Phone,
    Web,
    #[serde(rename = "linkedin")]
    LinkedIn,
}

impl ContactField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Web => "web",
            ContactField::LinkedIn => "linkedin",
        }
    }
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One marker rule: an icon element with an exact class signature whose
/// nearest enclosing `<a>` carries the contact link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRule {
    /// Field filled by this rule
    pub field: ContactField,

    /// Tag name of the marker element (usually "i")
    #[serde(default = "default_marker_tag")]
    pub marker_tag: String,

    /// Full class attribute of the marker, compared token by token
    pub marker_class: String,

    /// URI scheme prefix removed from the href (e.g. "mailto:")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
}

fn default_marker_tag() -> String {
    "i".to_string()
}

impl ContactRule {
    pub fn new(field: ContactField, marker_class: impl Into<String>) -> Self {
        Self {
            field,
            marker_tag: default_marker_tag(),
            marker_class: marker_class.into(),
            strip_prefix: None,
        }
    }

    pub fn stripping(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    /// Check a class attribute against the marker signature.
    ///
    /// Tokens must match in order; surrounding and repeated whitespace is
    /// ignored.
    pub fn matches_class(&self, class_attr: &str) -> bool {
        self.marker_class
            .split_whitespace()
            .eq(class_attr.split_whitespace())
    }

    /// Apply post-processing to a raw href.
    pub fn clean(&self, href: &str) -> String {
        match &self.strip_prefix {
            Some(prefix) => href.strip_prefix(prefix.as_str()).unwrap_or(href).to_string(),
            None => href.to_string(),
        }
    }
}

/// A versioned table of marker rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRuleSet {
    /// Identifies the rule revision in logs
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_rules")]
    pub rules: Vec<ContactRule>,
}

fn default_version() -> String {
    "fontawesome-6".to_string()
}

fn default_rules() -> Vec<ContactRule> {
    vec![
        ContactRule::new(ContactField::Email, "fa-solid fa-envelope mr-2").stripping("mailto:"),
        ContactRule::new(ContactField::Phone, "fa-solid fa-phone mr-2").stripping("tel:"),
        ContactRule::new(ContactField::Web, "fa-solid fa-globe mr-2"),
        ContactRule::new(ContactField::LinkedIn, "fa-brands fa-linkedin mr-2"),
    ]
}

impl Default for ContactRuleSet {
    fn default() -> Self {
        Self {
            version: default_version(),
            rules: default_rules(),
        }
    }
}
