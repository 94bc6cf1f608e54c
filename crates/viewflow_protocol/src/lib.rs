//! Shared records for the view-state reconciliation engine.
//!
//! This crate defines the data exchanged between a list screen, the
//! reconciliation controller, and the two external stores it synchronizes:
//!
//! - [`types`] — the canonical view records (`ViewQuery`, `ViewResult`,
//!   `PersistedViewState`) and the list-source request/response pair.
//! - [`nav`] — the Navigational State grammar: a flat key/value record with
//!   a query-string wire form, the part of view state a user can bookmark,
//!   share, or reach via back/forward navigation.
//! - [`config`] — per-screen configuration: filter shape, namespace, paging
//!   defaults. Screens differ only in this record.
//! - [`defaults`] — canonical constants shared by all screens.

pub mod config;
pub mod defaults;
pub mod nav;
pub mod types;

pub use config::{FilterField, FilterKind, ScreenSpec, SpecError};
pub use nav::NavRecord;
pub use types::{
    FilterSet, FilterValue, ListRequest, ListResponse, PersistedViewState, ViewMode, ViewQuery,
    ViewResult,
};
