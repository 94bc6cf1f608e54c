//! Canonical view-state records.
//!
//! Everything here is plain data: the controller owns the only mutable copy,
//! the adapters translate it, and the list screen renders it. All records are
//! serde-serializable because two of the three synchronized stores (the
//! navigational record and the durable cache) are textual.

use crate::defaults::DEFAULT_PAGE_SIZE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Filter values
// ============================================================================

/// A single filter field value. Filters are primitives by contract; anything
/// richer belongs to the screen, not to the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        FilterValue::Number(value)
    }

    pub fn flag(value: bool) -> Self {
        FilterValue::Flag(value)
    }

    /// Whether this value equals its type's empty/default value.
    ///
    /// Empty values are never serialized into navigational state, and
    /// assigning one to a filter set removes the field entirely, so
    /// "explicitly cleared" and "never set" are the same observable state.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(text) => text.is_empty(),
            FilterValue::Number(number) => *number == 0.0,
            FilterValue::Flag(flag) => !*flag,
        }
    }

    /// Navigational wire form. Booleans encode as the literal strings
    /// `true`/`false`; whole numbers drop the fractional part.
    pub fn encode(&self) -> String {
        match self {
            FilterValue::Text(text) => text.clone(),
            FilterValue::Number(number) => {
                if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
                    format!("{}", *number as i64)
                } else {
                    number.to_string()
                }
            }
            FilterValue::Flag(flag) => flag.to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Flag(value)
    }
}

/// An ordered mapping from filter-field name to value.
///
/// Ordering is deterministic (lexicographic) so that encoding the same
/// filters always yields the same navigational record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, FilterValue>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.0.get(name)
    }

    /// Assign a field. Assigning an empty/default value removes the field,
    /// which keeps cleared filters from reappearing after a cache restore.
    pub fn set(&mut self, name: impl Into<String>, value: FilterValue) {
        let name = name.into();
        if value.is_empty() {
            self.0.remove(&name);
        } else {
            self.0.insert(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterValue> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for (name, value) in iter {
            set.set(name, value.into());
        }
        set
    }
}

// ============================================================================
// View mode
// ============================================================================

/// Display mode of a list screen. The engine only synchronizes the value;
/// what each mode renders is the screen's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Primary tabular listing (default)
    #[default]
    Table,
    /// Secondary card layout
    Cards,
    /// Map overlay for screens with located records
    Map,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Table => "table",
            ViewMode::Cards => "cards",
            ViewMode::Map => "map",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(ViewMode::Table),
            "cards" => Ok(ViewMode::Cards),
            "map" => Ok(ViewMode::Map),
            _ => Err(format!(
                "Invalid view mode: '{}'. Expected: table, cards, or map",
                s
            )),
        }
    }
}

// ============================================================================
// View query
// ============================================================================

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// The canonical filter + pagination + sort + mode record driving a list
/// screen. One instance lives for the duration of a screen; the controller
/// mutates it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub filters: FilterSet,
    /// 1-based page index.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub view_mode: ViewMode,
}

impl ViewQuery {
    /// Default query for a given page size.
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            filters: FilterSet::new(),
            page: 1,
            page_size,
            sort_key: None,
            view_mode: ViewMode::default(),
        }
    }

    /// The list-source request this query resolves to.
    pub fn request(&self) -> ListRequest {
        ListRequest {
            filters: self.filters.clone(),
            page: self.page,
            page_size: self.page_size,
            sort_key: self.sort_key.clone(),
        }
    }
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

// ============================================================================
// List-source contract
// ============================================================================

/// Request sent to the remote record API. Consumed contract only; the engine
/// never interprets the items it gets back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    pub filters: FilterSet,
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

/// Response from the remote record API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub total_count: u64,
}

// ============================================================================
// View result
// ============================================================================

/// The most recent successful fetch. Produced only by the scheduler resolving
/// a request; failure never clears a previously rendered result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    pub items: Vec<Value>,
    pub total_count: u64,
    pub total_pages: u32,
    pub fetched_at: DateTime<Utc>,
}

impl ViewResult {
    /// Build a result from a successful response, deriving the page count
    /// from the page size the request was issued with.
    pub fn from_response(response: ListResponse, page_size: u32) -> Self {
        let total_pages = response.total_count.div_ceil(u64::from(page_size.max(1))) as u32;
        Self {
            items: response.items,
            total_count: response.total_count,
            total_pages,
            fetched_at: Utc::now(),
        }
    }
}

// ============================================================================
// Persisted view state
// ============================================================================

/// The unit stored in the durable cache, keyed by screen namespace.
///
/// Optional parts carry `#[serde(default)]` so that schema drift in stored
/// data degrades to defaults instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedViewState {
    pub query: ViewQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ViewResult>,
    #[serde(default)]
    pub has_searched: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_value_empty_by_type() {
        assert!(FilterValue::text("").is_empty());
        assert!(FilterValue::flag(false).is_empty());
        assert!(FilterValue::number(0.0).is_empty());
        assert!(!FilterValue::text("berlin").is_empty());
        assert!(!FilterValue::flag(true).is_empty());
        assert!(!FilterValue::number(3.0).is_empty());
    }

    #[test]
    fn filter_value_encoding() {
        assert_eq!(FilterValue::text("active").encode(), "active");
        assert_eq!(FilterValue::number(42.0).encode(), "42");
        assert_eq!(FilterValue::number(1.5).encode(), "1.5");
        assert_eq!(FilterValue::flag(true).encode(), "true");
        assert_eq!(FilterValue::flag(false).encode(), "false");
    }

    #[test]
    fn set_removes_cleared_fields() {
        let mut filters = FilterSet::new();
        filters.set("city", FilterValue::text("Berlin"));
        assert_eq!(filters.len(), 1);

        // Clearing via empty text removes the key instead of storing "".
        filters.set("city", FilterValue::text(""));
        assert!(filters.get("city").is_none());
        assert!(filters.is_empty());
    }

    #[test]
    fn filter_value_serde_untagged() {
        let filters: FilterSet = serde_json::from_value(json!({
            "city": "Berlin",
            "active": true,
            "min_size": 9.0
        }))
        .unwrap();
        assert_eq!(filters.get("city"), Some(&FilterValue::text("Berlin")));
        assert_eq!(filters.get("active"), Some(&FilterValue::flag(true)));
        assert_eq!(filters.get("min_size"), Some(&FilterValue::number(9.0)));
    }

    #[test]
    fn view_mode_roundtrip() {
        for mode in [ViewMode::Table, ViewMode::Cards, ViewMode::Map] {
            assert_eq!(mode.as_str().parse::<ViewMode>().unwrap(), mode);
        }
        assert!("satellite".parse::<ViewMode>().is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        let response = ListResponse {
            items: vec![],
            total_count: 40,
        };
        assert_eq!(ViewResult::from_response(response.clone(), 9).total_pages, 5);
        assert_eq!(ViewResult::from_response(response.clone(), 40).total_pages, 1);
        let empty = ListResponse {
            items: vec![],
            total_count: 0,
        };
        assert_eq!(ViewResult::from_response(empty, 25).total_pages, 0);
    }

    #[test]
    fn persisted_state_tolerates_schema_drift() {
        // Older cache entries lack `result` and `has_searched` entirely.
        let state: PersistedViewState = serde_json::from_value(json!({
            "query": { "filters": { "status": "active" } }
        }))
        .unwrap();
        assert!(state.result.is_none());
        assert!(!state.has_searched);
        assert_eq!(state.query.page, 1);
        assert_eq!(state.query.page_size, DEFAULT_PAGE_SIZE);
    }
}
