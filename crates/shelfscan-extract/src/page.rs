//! Read-only snapshot of one storefront page.
//!
//! Extraction never touches a live browser. The URL, the parsed DOM and
//! the JavaScript globals a storefront declared inline are captured here
//! once and passed to the extractors and the gate by reference.
//!
//! ## Recovering globals from static HTML
//!
//! Shopify themes declare their analytics payload inline, e.g.
//!
//! ```text
//! var meta = {"product":{"id":123,...},"page":{...}};
//! for (var attr in meta) {
//!   window.ShopifyAnalytics.meta[attr] = meta[attr];
//! }
//! ```
//!
//! Assignments whose right-hand side is a JSON object or array literal are
//! parsed and stored under the global's dotted name. Assignments we cannot
//! parse (`window.ShopifyAnalytics = window.ShopifyAnalytics || {}`) still
//! mark the global as declared, which is enough for platform fingerprinting.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::error::ExtractError;
use crate::parse_helpers::extract_balanced_json;

/// Dotted name of the Shopify analytics metadata global.
pub const ANALYTICS_META_GLOBAL: &str = "ShopifyAnalytics.meta";

/// Name of the bare `meta` global some templates declare instead.
pub const ALTERNATE_META_GLOBAL: &str = "meta";

static GLOBAL_ASSIGNMENTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (ANALYTICS_META_GLOBAL, r"window\.ShopifyAnalytics\.meta\s*=\s*"),
        (
            ALTERNATE_META_GLOBAL,
            r"(?:\b(?:var|let|const)\s+|\bwindow\.)meta\s*=\s*",
        ),
        ("ShopifyAnalytics", r"\bwindow\.ShopifyAnalytics\s*=\s*"),
        ("Shopify", r"\bwindow\.Shopify\s*=\s*"),
        ("Shopify", r"\bShopify\.(?:shop|theme|locale|currency)\s*=\s*"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect()
});

static META_COPY_LOOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ShopifyAnalytics\.meta\[\s*\w+\s*\]\s*=\s*meta\[\s*\w+\s*\]")
        .expect("valid regex")
});

/// A parsed page plus the inline globals recovered from its scripts.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    url: Url,
    document: Html,
    /// Declared globals. `Value::Null` means "declared, payload unknown".
    globals: HashMap<String, Value>,
}

impl PageSnapshot {
    /// Parses `html` fetched from `url` and recovers inline globals.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidUrl`] if `url` is not an absolute URL.
    pub fn from_html(url: &str, html: &str) -> Result<Self, ExtractError> {
        let url = Url::parse(url).map_err(|e| ExtractError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_parts(url, html))
    }

    /// Same as [`PageSnapshot::from_html`] for an already-parsed URL.
    #[must_use]
    pub fn from_parts(url: Url, html: &str) -> Self {
        let document = Html::parse_document(html);
        let globals = recover_globals(&document);
        tracing::debug!(
            url = %url,
            globals = ?globals.keys().collect::<Vec<_>>(),
            "built page snapshot"
        );
        Self {
            url,
            document,
            globals,
        }
    }

    /// Sets (or replaces) a global, builder style. Intended for synthetic
    /// snapshots in tests and for callers that read globals from a live page.
    #[must_use]
    pub fn with_global(mut self, name: &str, value: Value) -> Self {
        self.globals.insert(name.to_owned(), value);
        self
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Scheme + host (+ port), e.g. `"https://drinkhi.com"`.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    #[must_use]
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Returns the payload of a global, if one was recovered.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name).filter(|v| !v.is_null())
    }

    /// Returns `true` if the page declares the global at all.
    #[must_use]
    pub fn has_global(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    /// Resolves a possibly relative link against the page URL.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<String> {
        self.url.join(href.trim()).ok().map(String::from)
    }
}

fn recover_globals(document: &Html) -> HashMap<String, Value> {
    let mut globals: HashMap<String, Value> = HashMap::new();
    let Ok(script_selector) = Selector::parse("script:not([src])") else {
        return globals;
    };

    let mut copies_meta = false;
    for script in document.select(&script_selector) {
        let text: String = script.text().collect();
        if text.trim().is_empty() {
            continue;
        }
        copies_meta |= META_COPY_LOOP.is_match(&text);

        for (name, pattern) in GLOBAL_ASSIGNMENTS.iter() {
            for m in pattern.find_iter(&text) {
                let rhs = &text[m.end()..];
                match extract_balanced_json(rhs).map(serde_json::from_str::<Value>) {
                    Some(Ok(value)) => {
                        merge_global(&mut globals, name, value);
                    }
                    Some(Err(e)) => {
                        tracing::debug!(global = name, error = %e, "global payload is not JSON");
                        globals.entry((*name).to_owned()).or_insert(Value::Null);
                    }
                    None => {
                        globals.entry((*name).to_owned()).or_insert(Value::Null);
                    }
                }
            }
        }
    }

    if copies_meta {
        if let Some(meta) = globals.get(ALTERNATE_META_GLOBAL).cloned() {
            merge_global(&mut globals, ANALYTICS_META_GLOBAL, meta);
        }
    }

    globals
}

/// Object payloads are merged key-by-key (later assignments win, the way
/// repeated `meta[attr] = …` writes behave); anything else replaces.
fn merge_global(globals: &mut HashMap<String, Value>, name: &str, value: Value) {
    match globals.get_mut(name) {
        Some(Value::Object(existing)) if value.is_object() => {
            if let Value::Object(incoming) = value {
                existing.extend(incoming);
            }
        }
        _ => {
            globals.insert(name.to_owned(), value);
        }
    }
}
