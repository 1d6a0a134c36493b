// src/models/exhibitor.rs

//! Exhibitor data structures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::ContactField;

/// One hit as returned by the search index.
///
/// No key is guaranteed; every accessor returns `None` for a missing or
/// null value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawHit(Map<String, Value>);

impl RawHit {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Read a scalar as text. Numbers and booleans are rendered as-is.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_text)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Read an ordered list of scalars. Anything that is not a list is `None`.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(scalar_text).collect())
    }
}

impl From<Map<String, Value>> for RawHit {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Contact details scraped from an exhibitor's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub web: Option<String>,
    #[serde(rename = "linkedIn")]
    pub linkedin: Option<String>,
}

impl ContactInfo {
    pub fn set(&mut self, field: ContactField, value: Option<String>) {
        let slot = match field {
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone_number,
            ContactField::Web => &mut self.web,
            ContactField::LinkedIn => &mut self.linkedin,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.phone_number.is_none()
            && self.web.is_none()
            && self.linkedin.is_none()
    }
}

/// A normalized exhibitor with its contact details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExhibitorRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    /// `None` when the hit had no interest list
    pub interests: Option<Vec<String>>,
    pub url: Option<String>,
    pub country: Option<String>,
    pub is_startup: Option<bool>,
    pub stage: Option<String>,
    pub founding: Option<String>,
    #[serde(flatten)]
    pub contact: ContactInfo,
}

impl ExhibitorRecord {
    /// Export column names, in export order.
    pub const COLUMNS: [&'static str; 12] = [
        "id",
        "name",
        "interests",
        "url",
        "country",
        "is_startup",
        "stage",
        "founding",
        "email",
        "phone_number",
        "web",
        "linkedIn",
    ];

    /// Interests flattened to a single cell.
    pub fn interests_joined(&self) -> String {
        self.interests
            .as_ref()
            .map(|items| items.join(", "))
            .unwrap_or_default()
    }

    /// Cell values in `COLUMNS` order; absent values are empty.
    pub fn cells(&self) -> [String; 12] {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        [
            text(&self.id),
            text(&self.name),
            self.interests_joined(),
            text(&self.url),
            text(&self.country),
            match self.is_startup {
                Some(true) => "True".to_string(),
                Some(false) => "False".to_string(),
                None => String::new(),
            },
            text(&self.stage),
            text(&self.founding),
            text(&self.contact.email),
            text(&self.contact.phone_number),
            text(&self.contact.web),
            text(&self.contact.linkedin),
        ]
    }
}
