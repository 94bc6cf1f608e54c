//! Per-screen configuration.
//!
//! Ten list screens share one reconciliation engine; a screen is nothing but
//! a [`ScreenSpec`]: its durable-cache namespace, the shape of its filter
//! set, and its paging defaults. Specs are serde-deserializable so hosts can
//! declare screens in configuration files.

use crate::defaults::{DEFAULT_PAGE_SIZE, RESERVED_NAV_KEYS};
use crate::types::{ViewMode, ViewQuery};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Screen configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    #[error("Screen namespace must not be empty")]
    EmptyNamespace,

    #[error("Screen '{0}' has a page size of 0")]
    InvalidPageSize(String),

    #[error("Screen '{namespace}' declares filter field '{field}' twice")]
    DuplicateField { namespace: String, field: String },

    #[error("Screen '{namespace}' uses reserved navigational key '{field}' as a filter name")]
    ReservedField { namespace: String, field: String },

    #[error("Screen namespace '{0}' is already registered")]
    DuplicateNamespace(String),
}

/// Primitive kind of a filter field. Text fields are the ones the scheduler
/// debounces; number and flag fields fetch immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Text,
    Number,
    Flag,
}

/// One filter field of a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    pub name: String,
    pub kind: FilterKind,
}

impl FilterField {
    pub fn new(name: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_true() -> bool {
    true
}

/// Full description of a list screen as the engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSpec {
    /// Durable-cache namespace. Must be unique across registered screens.
    pub namespace: String,
    /// Filter fields this screen exposes.
    pub fields: Vec<FilterField>,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default)]
    pub default_view_mode: ViewMode,
    /// Whether switching display mode resets pagination to page 1.
    /// The source screens disagreed on this; true is the uniform policy.
    #[serde(default = "default_true")]
    pub reset_page_on_view_mode: bool,
}

impl ScreenSpec {
    pub fn new(namespace: impl Into<String>, fields: Vec<FilterField>) -> Self {
        Self {
            namespace: namespace.into(),
            fields,
            default_page_size: DEFAULT_PAGE_SIZE,
            default_view_mode: ViewMode::default(),
            reset_page_on_view_mode: true,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.default_view_mode = mode;
        self
    }

    /// Check structural invariants: non-empty namespace, positive page size,
    /// unique field names, no collision with reserved navigational keys.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.namespace.trim().is_empty() {
            return Err(SpecError::EmptyNamespace);
        }
        if self.default_page_size == 0 {
            return Err(SpecError::InvalidPageSize(self.namespace.clone()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if RESERVED_NAV_KEYS.contains(&field.name.as_str()) {
                return Err(SpecError::ReservedField {
                    namespace: self.namespace.clone(),
                    field: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SpecError::DuplicateField {
                    namespace: self.namespace.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// The query a freshly mounted screen starts from.
    pub fn default_query(&self) -> ViewQuery {
        let mut query = ViewQuery::with_page_size(self.default_page_size);
        query.view_mode = self.default_view_mode;
        query
    }

    /// Kind of a declared filter field, `None` for unknown names.
    pub fn kind_of(&self, name: &str) -> Option<FilterKind> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.kind)
    }
}
