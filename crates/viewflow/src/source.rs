//! List-source contract.

use anyhow::Result;
use async_trait::async_trait;
use viewflow_protocol::{ListRequest, ListResponse};

/// The remote record API as the engine sees it: one paged list query.
///
/// Implementations wrap whatever transport the host uses. Errors are
/// non-fatal: the controller keeps the previous result and surfaces the
/// message, and retry is re-issuing the same query.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// Execute a single list query.
    async fn fetch(&self, request: ListRequest) -> Result<ListResponse>;
}
