//! Navigational State grammar.
//!
//! The shareable/bookmarkable slice of view state is a flat key/value record:
//! one level deep, all values strings, absent key means "field at default".
//! Its wire form is a standard query string. Writing the record to a real
//! address bar (and observing back/forward changes) is the host's job; this
//! module only translates.
//!
//! Encoding is minimal by invariant: a default-valued field is never emitted,
//! so an empty record and "never searched" are indistinguishable on purpose.

use crate::config::{FilterKind, ScreenSpec};
use crate::defaults::{NAV_KEY_PAGE, NAV_KEY_SORT, NAV_KEY_VIEW};
use crate::types::{FilterValue, ViewMode, ViewQuery};
use std::collections::BTreeMap;
use std::str::FromStr;
use url::form_urlencoded;

/// A flat, ordered key/value record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavRecord(BTreeMap<String, String>);

impl NavRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Percent-encoded query-string form, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Parse a query string, with or without a leading `?`. Repeated keys
    /// keep the last occurrence.
    pub fn from_query_string(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut record = BTreeMap::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            record.insert(key.into_owned(), value.into_owned());
        }
        Self(record)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NavRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = NavRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Encode a query into its navigational record.
///
/// Drops every filter field at its empty/default value, omits `page` when it
/// is 1, `view` when it is the mode default, and `sort` when absent. Page
/// size is screen configuration and never part of navigation state.
pub fn encode(query: &ViewQuery) -> NavRecord {
    let mut record = NavRecord::new();
    for (name, value) in query.filters.iter() {
        if !value.is_empty() {
            record.insert(name.clone(), value.encode());
        }
    }
    if query.page > 1 {
        record.insert(NAV_KEY_PAGE, query.page.to_string());
    }
    if let Some(ref sort_key) = query.sort_key {
        if !sort_key.is_empty() {
            record.insert(NAV_KEY_SORT, sort_key.clone());
        }
    }
    if query.view_mode != ViewMode::default() {
        record.insert(NAV_KEY_VIEW, query.view_mode.as_str());
    }
    record
}

/// Decode a navigational record against a screen's shape.
///
/// Starts from the screen's default query. Unknown keys are ignored for
/// forward compatibility; malformed numeric or flag values fall back to the
/// field default rather than failing.
pub fn decode(record: &NavRecord, spec: &ScreenSpec) -> ViewQuery {
    let mut query = spec.default_query();

    for field in &spec.fields {
        let Some(raw) = record.get(&field.name) else {
            continue;
        };
        let value = match field.kind {
            FilterKind::Text => Some(FilterValue::Text(raw.to_string())),
            FilterKind::Number => raw
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(FilterValue::Number),
            FilterKind::Flag => match raw {
                "true" => Some(FilterValue::Flag(true)),
                "false" => Some(FilterValue::Flag(false)),
                _ => None,
            },
        };
        if let Some(value) = value {
            query.filters.set(field.name.clone(), value);
        }
    }

    if let Some(raw) = record.get(NAV_KEY_PAGE) {
        query.page = raw.parse::<u32>().ok().filter(|page| *page >= 1).unwrap_or(1);
    }
    if let Some(raw) = record.get(NAV_KEY_SORT) {
        if !raw.is_empty() {
            query.sort_key = Some(raw.to_string());
        }
    }
    if let Some(raw) = record.get(NAV_KEY_VIEW) {
        if let Ok(mode) = ViewMode::from_str(raw) {
            query.view_mode = mode;
        }
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterField;
    use crate::types::ViewMode;

    fn spec() -> ScreenSpec {
        ScreenSpec::new(
            "inventory",
            vec![
                FilterField::new("search", FilterKind::Text),
                FilterField::new("city", FilterKind::Text),
                FilterField::new("min_kw", FilterKind::Number),
                FilterField::new("in_stock", FilterKind::Flag),
            ],
        )
        .with_page_size(9)
    }

    #[test]
    fn encode_drops_defaults() {
        let query = spec().default_query();
        assert!(encode(&query).is_empty(), "default query encodes to nothing");
    }

    #[test]
    fn encode_omits_page_one_and_default_mode() {
        let mut query = spec().default_query();
        query.filters.set("city", FilterValue::text("Berlin"));
        query.page = 1;
        let record = encode(&query);
        assert_eq!(record.get("city"), Some("Berlin"));
        assert_eq!(record.get(NAV_KEY_PAGE), None);
        assert_eq!(record.get(NAV_KEY_VIEW), None);
    }

    #[test]
    fn roundtrip_preserves_non_default_fields() {
        let spec = spec();
        let mut query = spec.default_query();
        query.filters.set("search", FilterValue::text("sunny"));
        query.filters.set("min_kw", FilterValue::number(5.0));
        query.filters.set("in_stock", FilterValue::flag(true));
        query.page = 3;
        query.sort_key = Some("name".to_string());
        query.view_mode = ViewMode::Map;

        let decoded = decode(&encode(&query), &spec);
        assert_eq!(decoded, query);
    }

    #[test]
    fn roundtrip_through_query_string() {
        let spec = spec();
        let mut query = spec.default_query();
        query.filters.set("search", FilterValue::text("Größe & Watt"));
        query.page = 2;

        let wire = encode(&query).to_query_string();
        let decoded = decode(&NavRecord::from_query_string(&wire), &spec);
        assert_eq!(decoded, query, "percent-encoding must be lossless");
    }

    #[test]
    fn unknown_keys_ignored() {
        let record: NavRecord = [("utm_source", "mail"), ("city", "Berlin")]
            .into_iter()
            .collect();
        let decoded = decode(&record, &spec());
        assert_eq!(decoded.filters.get("city"), Some(&FilterValue::text("Berlin")));
        assert_eq!(decoded.filters.len(), 1);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let record: NavRecord = [
            ("min_kw", "lots"),
            ("in_stock", "yes"),
            ("page", "-2"),
            ("view", "satellite"),
        ]
        .into_iter()
        .collect();
        let decoded = decode(&record, &spec());
        assert!(decoded.filters.is_empty());
        assert_eq!(decoded.page, 1);
        assert_eq!(decoded.view_mode, ViewMode::Table);
    }

    #[test]
    fn page_size_never_encoded() {
        let mut query = spec().default_query();
        query.page_size = 50;
        query.filters.set("city", FilterValue::text("Bonn"));
        let record = encode(&query);
        assert!(record.iter().all(|(key, _)| key != "page_size"));
        // ...and decode restores the screen default, not the mutated size.
        assert_eq!(decode(&record, &spec()).page_size, 9);
    }
}
