//! Fetch Scheduler.
//!
//! Issues list queries as tokio tasks. Free-text input is debounced with a
//! fixed quiet window; everything else (pagination, explicit search, reset)
//! fetches immediately. At most one scheduled task exists per screen: a new
//! schedule aborts the previous one whether its timer has fired or not, and
//! every request carries a monotonically increasing id so the controller can
//! discard anything but the latest response even if an aborted task already
//! delivered its outcome.

use crate::source::ListSource;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;
use viewflow_protocol::defaults::DEBOUNCE_QUIET_MS;
use viewflow_protocol::{ListResponse, ViewQuery};

/// Monotonically increasing per-screen request tag. Ids start at 1; 0 never
/// identifies a request.
pub type RequestId = u64;

/// A resolved fetch, success or failure, delivered to the host loop.
#[derive(Debug)]
pub struct FetchOutcome {
    pub request_id: RequestId,
    /// The query the request was issued for.
    pub query: ViewQuery,
    pub result: Result<ListResponse>,
}

/// One scheduler per screen instance.
pub struct FetchScheduler {
    source: Arc<dyn ListSource>,
    outcomes: UnboundedSender<FetchOutcome>,
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
    last_issued: RequestId,
}

impl FetchScheduler {
    /// Create a scheduler with the canonical quiet window. Returns the
    /// receiving end the host loop drains outcomes from.
    pub fn new(source: Arc<dyn ListSource>) -> (Self, UnboundedReceiver<FetchOutcome>) {
        Self::with_quiet_window(source, Duration::from_millis(DEBOUNCE_QUIET_MS))
    }

    pub fn with_quiet_window(
        source: Arc<dyn ListSource>,
        quiet: Duration,
    ) -> (Self, UnboundedReceiver<FetchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                source,
                outcomes: tx,
                quiet,
                pending: None,
                last_issued: 0,
            },
            rx,
        )
    }

    /// Accept a schedule request and return its id.
    ///
    /// Cancels any previously scheduled task first, so rapid keystrokes
    /// collapse into one fetch carrying the final query. Exactly one logical
    /// fetch is performed per accepted schedule that is not superseded.
    pub fn schedule(&mut self, query: ViewQuery, immediate: bool) -> RequestId {
        self.cancel();

        self.last_issued += 1;
        let request_id = self.last_issued;
        let source = Arc::clone(&self.source);
        let outcomes = self.outcomes.clone();
        let quiet = self.quiet;
        debug!(request_id, immediate, "scheduling list fetch");

        self.pending = Some(tokio::spawn(async move {
            if !immediate {
                tokio::time::sleep(quiet).await;
            }
            let result = source.fetch(query.request()).await;
            // The receiver may be gone during teardown; nothing to do then.
            let _ = outcomes.send(FetchOutcome {
                request_id,
                query,
                result,
            });
        }));

        request_id
    }

    /// Abort the pending task, if any. Called on supersession and teardown.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Id of the most recently issued request, 0 if none yet.
    pub fn last_issued(&self) -> RequestId {
        self.last_issued
    }
}

impl Drop for FetchScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use viewflow_protocol::{FilterValue, ListRequest};

    /// Source that records every request it actually receives.
    struct RecordingSource {
        requests: Mutex<Vec<ListRequest>>,
    }

    impl RecordingSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<ListRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ListSource for RecordingSource {
        async fn fetch(&self, request: ListRequest) -> Result<ListResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(ListResponse {
                items: vec![],
                total_count: 0,
            })
        }
    }

    fn query_with_search(text: &str) -> ViewQuery {
        let mut query = ViewQuery::default();
        query.filters.set("search", FilterValue::text(text));
        query
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_collapse_to_final_value() {
        let source = RecordingSource::new();
        let (mut scheduler, mut rx) = FetchScheduler::new(source.clone());

        for text in ["s", "su", "sun", "sunn", "sunny"] {
            scheduler.schedule(query_with_search(text), false);
            tokio::time::advance(Duration::from_millis(50)).await;
        }

        let outcome = rx.recv().await.expect("one fetch fires after the window");
        assert_eq!(outcome.request_id, scheduler.last_issued());
        let seen = source.seen();
        assert_eq!(seen.len(), 1, "N keystrokes produce exactly 1 fetch");
        assert_eq!(
            seen[0].filters.get("search"),
            Some(&FilterValue::text("sunny"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_bypasses_quiet_window() {
        let source = RecordingSource::new();
        let (mut scheduler, mut rx) = FetchScheduler::new(source.clone());

        scheduler.schedule(ViewQuery::default(), true);
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.request_id, 1);
        assert_eq!(source.seen().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn request_ids_increase_monotonically() {
        let source = RecordingSource::new();
        let (mut scheduler, _rx) = FetchScheduler::new(source);

        let first = scheduler.schedule(ViewQuery::default(), true);
        let second = scheduler.schedule(ViewQuery::default(), true);
        let third = scheduler.schedule(ViewQuery::default(), false);
        assert!(first < second && second < third);
        assert_eq!(scheduler.last_issued(), third);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_pending_fetch() {
        let source = RecordingSource::new();
        let (mut scheduler, mut rx) = FetchScheduler::new(source.clone());

        scheduler.schedule(query_with_search("abandoned"), false);
        scheduler.cancel();
        tokio::time::advance(Duration::from_millis(DEBOUNCE_QUIET_MS * 2)).await;

        assert!(rx.try_recv().is_err(), "cancelled timer must not fire");
        assert!(source.seen().is_empty());
    }
}
