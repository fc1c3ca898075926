use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Element category
// ============================================================================

/// Kind of interactable element. Categories without a dedicated accessor
/// shape are carried through verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    InputField,
    Button,
    Checkbox,
    Radio,
    Dropdown,
    Other(String),
}

impl Category {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "input_field" => Category::InputField,
            "button" => Category::Button,
            "checkbox" => Category::Checkbox,
            "radio" => Category::Radio,
            "dropdown" => Category::Dropdown,
            _ => Category::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::InputField => "input_field",
            Category::Button => "button",
            Category::Checkbox => "checkbox",
            Category::Radio => "radio",
            Category::Dropdown => "dropdown",
            Category::Other(raw) if raw.is_empty() => "other",
            Category::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

// ============================================================================
// Locator record
// ============================================================================

/// Why a candidate locator was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorRejection {
    #[error("entry is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("entry has an empty identifier")]
    EmptyIdentifier,

    #[error("identifier '{0}' was already accepted")]
    DuplicateIdentifier(String),

    #[error("'{0}' has neither an xpath nor a css selector")]
    NoLocator(String),
}

/// Loosely-typed locator as the oracle emits it. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocator {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(default)]
    pub css_selector: Option<String>,
}

impl RawLocator {
    /// Read a candidate out of an arbitrary JSON value. Scalar fields that are
    /// not strings (numbers, booleans) are stringified; null counts as absent.
    pub fn from_value(value: &Value) -> Result<Self, LocatorRejection> {
        let object = value
            .as_object()
            .ok_or_else(|| LocatorRejection::NotAnObject(value.to_string()))?;

        let field = |key: &str| -> Option<String> {
            match object.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            }
        };

        Ok(RawLocator {
            identifier: field("identifier"),
            category: field("category"),
            xpath: field("xpath"),
            css_selector: field("css_selector"),
        })
    }
}

/// One usable interactable-element descriptor.
///
/// Only obtainable through [`LocatorRecord::new`] (or deserialization, which
/// goes through it): the identifier is non-empty and at least one locator
/// expression is present. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLocator")]
pub struct LocatorRecord {
    identifier: String,
    category: Category,
    xpath: String,
    css_selector: String,
}

impl LocatorRecord {
    pub fn new(
        identifier: &str,
        category: Category,
        xpath: &str,
        css_selector: &str,
    ) -> Result<Self, LocatorRejection> {
        if identifier.trim().is_empty() {
            return Err(LocatorRejection::EmptyIdentifier);
        }
        if xpath.trim().is_empty() && css_selector.trim().is_empty() {
            return Err(LocatorRejection::NoLocator(identifier.to_string()));
        }

        Ok(Self {
            identifier: identifier.to_string(),
            category,
            xpath: xpath.trim().to_string(),
            css_selector: css_selector.trim().to_string(),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn xpath(&self) -> &str {
        &self.xpath
    }

    pub fn css_selector(&self) -> &str {
        &self.css_selector
    }

    pub fn has_xpath(&self) -> bool {
        !self.xpath.is_empty()
    }

    /// Identifier as it reads in prose: underscores become spaces.
    pub fn human_identifier(&self) -> String {
        self.identifier.replace('_', " ")
    }
}

impl TryFrom<RawLocator> for LocatorRecord {
    type Error = LocatorRejection;

    fn try_from(raw: RawLocator) -> Result<Self, Self::Error> {
        LocatorRecord::new(
            raw.identifier.as_deref().unwrap_or(""),
            Category::parse(raw.category.as_deref().unwrap_or("other")),
            raw.xpath.as_deref().unwrap_or(""),
            raw.css_selector.as_deref().unwrap_or(""),
        )
    }
}

// ============================================================================
// Page-level validation / dedup
// ============================================================================

/// Accepted records of one page, in acceptance order. Enforces identifier
/// uniqueness on top of the per-record checks; the first occurrence wins.
#[derive(Debug, Default)]
pub struct LocatorSet {
    records: Vec<LocatorRecord>,
    seen: HashSet<String>,
    rejected: Vec<LocatorRejection>,
}

impl LocatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a list of oracle entries in input order.
    pub fn from_values(entries: &[Value]) -> Self {
        let mut set = Self::new();
        for entry in entries {
            if let Err(rejection) = set.push_value(entry) {
                tracing::debug!(%rejection, "Skipping locator");
            }
        }
        set
    }

    pub fn push_value(&mut self, entry: &Value) -> Result<(), LocatorRejection> {
        let result = RawLocator::from_value(entry).and_then(|raw| self.push_raw(raw));
        if let Err(rejection) = &result {
            self.rejected.push(rejection.clone());
        }
        result
    }

    fn push_raw(&mut self, raw: RawLocator) -> Result<(), LocatorRejection> {
        let identifier = raw.identifier.clone().unwrap_or_default();
        if identifier.trim().is_empty() {
            return Err(LocatorRejection::EmptyIdentifier);
        }
        if self.seen.contains(&identifier) {
            return Err(LocatorRejection::DuplicateIdentifier(identifier));
        }

        let record = LocatorRecord::try_from(raw)?;
        self.seen.insert(identifier);
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[LocatorRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<LocatorRecord> {
        self.records
    }

    pub fn rejected(&self) -> &[LocatorRejection] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
