//! View-state reconciliation engine for list screens.
//!
//! Admin list screens (customers, dealers, inventory, ...) keep the same
//! state in three places: the shareable navigational record, a durable
//! per-screen cache that survives reloads, and the in-memory state the view
//! renders. This crate owns the synchronization between them so individual
//! screens do not have to: one [`ViewController`] per screen instance,
//! parameterized only by a [`ScreenSpec`](viewflow_protocol::ScreenSpec).
//!
//! # Design
//!
//! The controller is driven by discrete named events (`initialize`,
//! `apply_filters`, `go_to_page`, ...), never by re-run-on-change watchers.
//! Fetches run as tokio tasks; outcomes come back over a channel, tagged
//! with a monotonically increasing request id so late responses of
//! superseded requests are discarded instead of applied.
//!
//! Single consumer by contract: a controller belongs to one screen instance
//! on one logical thread. The only suspension point is the fetch itself.

mod cache;
mod controller;
mod error;
mod scheduler;
mod screen;
mod source;

pub use cache::{CacheStore, DurableCache, JsonFileCacheStore, MemoryCacheStore};
pub use controller::{ReconcileState, ViewController, ViewState};
pub use error::CacheError;
pub use scheduler::{FetchOutcome, FetchScheduler, RequestId};
pub use screen::ScreenRegistry;
pub use source::ListSource;
