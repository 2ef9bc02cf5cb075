//! Source-shaped records produced by the raw extractors.

use serde_json::{Map, Value};

/// Which extraction strategy produced a [`RawCandidate`].
///
/// The mapper keys unit conversion off this tag, never off the magnitude of
/// a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// `window.ShopifyAnalytics.meta`.
    EmbeddedAnalytics,
    /// The bare `meta` global some storefront templates declare.
    AlternateGlobal,
    /// schema.org JSON-LD blocks.
    StructuredData,
    /// Product tiles scraped from the DOM.
    DomHeuristic,
}

impl CandidateSource {
    /// Returns `true` for sources that encode money in minor units (cents).
    #[must_use]
    pub fn uses_minor_units(self) -> bool {
        matches!(
            self,
            CandidateSource::EmbeddedAnalytics | CandidateSource::AlternateGlobal
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateSource::EmbeddedAnalytics => "embedded_analytics",
            CandidateSource::AlternateGlobal => "alternate_global",
            CandidateSource::StructuredData => "structured_data",
            CandidateSource::DomHeuristic => "dom_heuristic",
        }
    }
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw record as a single extractor saw it, before canonical mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub source: CandidateSource,
    pub fields: Map<String, Value>,
}

impl RawCandidate {
    #[must_use]
    pub fn new(source: CandidateSource) -> Self {
        Self {
            source,
            fields: Map::new(),
        }
    }

    /// Wraps an existing JSON object. Returns `None` for non-object values.
    #[must_use]
    pub fn from_value(source: CandidateSource, value: &Value) -> Option<Self> {
        value.as_object().map(|fields| Self {
            source,
            fields: fields.clone(),
        })
    }

    /// Sets `key`, builder style.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    /// Sets `key` only when `value` is present.
    pub fn insert_opt(&mut self, key: &str, value: Option<impl Into<Value>>) {
        if let Some(v) = value {
            self.fields.insert(key.to_owned(), v.into());
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// Returns the first of `keys` holding a non-empty string, trimmed.
    #[must_use]
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.get(k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}
