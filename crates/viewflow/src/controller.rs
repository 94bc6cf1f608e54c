//! View-State Controller — the reconciliation state machine.
//!
//! One controller per mounted list screen. It owns the canonical in-memory
//! [`ViewState`], arbitrates precedence between the navigational record and
//! the durable cache at mount time, and drives every transition afterwards
//! from discrete named events. The adapters it talks to are stateless;
//! nothing mutates view state but this type.
//!
//! Precedence invariant: navigational state always wins. The cache is
//! consulted once, at mount, and only when the navigational record encodes
//! nothing.

use crate::cache::DurableCache;
use crate::scheduler::{FetchOutcome, FetchScheduler, RequestId};
use tracing::{debug, warn};
use viewflow_protocol::{
    nav, FilterKind, FilterValue, NavRecord, PersistedViewState, ScreenSpec, ViewMode, ViewQuery,
    ViewResult,
};

/// Lifecycle tag of the controller.
///
/// `Empty` is the settled state of a screen that has nothing to show and
/// nothing in flight. The restore states are in-flight like `Fetching` and
/// last until the mount revalidation resolves. `Errored` is a presentation
/// sub-state of `Idle`: the previous result is retained, only the error
/// signal differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileState {
    #[default]
    Uninitialized,
    RestoringFromNav,
    RestoringFromCache,
    Empty,
    Idle,
    Fetching,
    Errored,
}

impl ReconcileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileState::Uninitialized => "uninitialized",
            ReconcileState::RestoringFromNav => "restoring_from_nav",
            ReconcileState::RestoringFromCache => "restoring_from_cache",
            ReconcileState::Empty => "empty",
            ReconcileState::Idle => "idle",
            ReconcileState::Fetching => "fetching",
            ReconcileState::Errored => "errored",
        }
    }

    /// Whether the controller is at rest (no fetch in flight).
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ReconcileState::Empty | ReconcileState::Idle | ReconcileState::Errored
        )
    }
}

/// Everything a list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub query: ViewQuery,
    pub result: Option<ViewResult>,
    pub has_searched: bool,
    pub state: ReconcileState,
    /// Non-fatal fetch error, present only in `Errored`.
    pub error: Option<String>,
}

impl ViewState {
    fn empty(spec: &ScreenSpec) -> Self {
        Self {
            query: spec.default_query(),
            result: None,
            has_searched: false,
            state: ReconcileState::Uninitialized,
            error: None,
        }
    }
}

/// The reconciliation engine for one screen instance.
pub struct ViewController {
    spec: ScreenSpec,
    cache: DurableCache,
    scheduler: FetchScheduler,
    view: ViewState,
    /// The navigational record this controller last wrote. The host mirrors
    /// it into the real address bar; incoming navigation events equal to it
    /// are our own writes echoed back and must not re-trigger a fetch.
    nav: NavRecord,
    latest_request: Option<RequestId>,
    initialized: bool,
}

impl ViewController {
    pub fn new(spec: ScreenSpec, cache: DurableCache, scheduler: FetchScheduler) -> Self {
        let view = ViewState::empty(&spec);
        Self {
            spec,
            cache,
            scheduler,
            view,
            nav: NavRecord::new(),
            latest_request: None,
            initialized: false,
        }
    }

    // ========================================================================
    // Screen contract
    // ========================================================================

    /// Mount-time reconciliation.
    ///
    /// Navigational state first; the durable cache only when navigation
    /// encodes nothing; defaults otherwise. Calling twice is a no-op.
    pub fn initialize(&mut self, record: &NavRecord) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let decoded = nav::decode(record, &self.spec);
        if !nav::encode(&decoded).is_empty() {
            debug!(namespace = %self.spec.namespace, "restoring view state from navigation");
            self.view.query = decoded;
            self.view.has_searched = true;
            self.nav = nav::encode(&self.view.query);
            self.start_fetch(ReconcileState::RestoringFromNav, true);
            return;
        }

        let persisted = self
            .cache
            .load(&self.spec.namespace)
            .filter(|state| state.has_searched);
        if let Some(persisted) = persisted {
            debug!(namespace = %self.spec.namespace, "restoring view state from cache");
            self.view.query = persisted.query;
            // Instant redisplay of the cached rows, then revalidate.
            self.view.result = persisted.result;
            self.view.has_searched = true;
            // Promote into navigational state so bookmarking and
            // back/forward work from this point on.
            self.nav = nav::encode(&self.view.query);
            self.start_fetch(ReconcileState::RestoringFromCache, true);
            return;
        }

        // Nothing to restore: rest in Empty until the first user action.
        debug!(namespace = %self.spec.namespace, "no prior view state; starting empty");
        self.view.state = ReconcileState::Empty;
    }

    /// Merge a partial filter change. A field assigned its empty value is
    /// cleared. Any filter change invalidates the pagination position.
    ///
    /// The fetch is debounced when every touched field is free text and
    /// immediate otherwise.
    pub fn apply_filters<I>(&mut self, changes: I)
    where
        I: IntoIterator<Item = (String, FilterValue)>,
    {
        self.ensure_initialized();

        let mut touched = 0usize;
        let mut all_text = true;
        for (name, value) in changes {
            let Some(kind) = self.spec.kind_of(&name) else {
                warn!(namespace = %self.spec.namespace, field = %name, "ignoring unknown filter field");
                continue;
            };
            if kind != FilterKind::Text {
                all_text = false;
            }
            self.view.query.filters.set(name, value);
            touched += 1;
        }
        if touched == 0 {
            return;
        }

        self.view.query.page = 1;
        self.view.has_searched = true;
        self.write_through();
        self.start_fetch(ReconcileState::Fetching, !all_text);
    }

    /// Explicit search submission: fetch the current query immediately.
    /// Also the retry path after a fetch error.
    pub fn submit_search(&mut self) {
        self.ensure_initialized();
        self.view.has_searched = true;
        self.write_through();
        self.start_fetch(ReconcileState::Fetching, true);
    }

    /// Jump to a page. Leaves every filter untouched.
    pub fn go_to_page(&mut self, page: u32) {
        self.ensure_initialized();
        self.view.query.page = page.max(1);
        self.view.has_searched = true;
        self.write_through();
        self.start_fetch(ReconcileState::Fetching, true);
    }

    /// Switch display mode. Resets pagination when the screen's policy says
    /// so (the default, since some modes page differently or not at all).
    pub fn change_view_mode(&mut self, mode: ViewMode) {
        self.ensure_initialized();
        if self.view.query.view_mode == mode {
            return;
        }
        self.view.query.view_mode = mode;
        if self.spec.reset_page_on_view_mode {
            self.view.query.page = 1;
        }
        self.view.has_searched = true;
        self.write_through();
        self.start_fetch(ReconcileState::Fetching, true);
    }

    /// Change the sort order. Sorting behaves like a filter change: the
    /// pagination position is invalidated.
    pub fn set_sort(&mut self, sort_key: Option<String>) {
        self.ensure_initialized();
        let sort_key = sort_key.filter(|key| !key.is_empty());
        if self.view.query.sort_key == sort_key {
            return;
        }
        self.view.query.sort_key = sort_key;
        self.view.query.page = 1;
        self.view.has_searched = true;
        self.write_through();
        self.start_fetch(ReconcileState::Fetching, true);
    }

    /// Back to the pristine screen: navigation cleared, cache entry deleted,
    /// defaults restored, nothing fetched. Idempotent.
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.latest_request = None;
        self.cache.clear(&self.spec.namespace);
        self.nav = NavRecord::new();
        self.view = ViewState::empty(&self.spec);
        self.view.state = ReconcileState::Empty;
        self.initialized = true;
        debug!(namespace = %self.spec.namespace, "view state reset");
    }

    /// External navigation event (link, browser back/forward) after mount.
    ///
    /// Re-runs the navigation branch of the mount reconciliation only; the
    /// cache is never consulted again. Guarded against our own promotion
    /// write echoing back, which would otherwise double-fetch a
    /// cache-restored screen.
    pub fn on_navigation(&mut self, record: &NavRecord) {
        if !self.initialized {
            self.initialize(record);
            return;
        }
        if *record == self.nav {
            debug!(namespace = %self.spec.namespace, "navigation event is our own write; ignoring");
            return;
        }

        let decoded = nav::decode(record, &self.spec);
        if nav::encode(&decoded).is_empty() {
            // Back to the pre-search entry. The cache entry stays; only an
            // explicit reset deletes it.
            debug!(namespace = %self.spec.namespace, "navigated to empty state");
            self.scheduler.cancel();
            self.latest_request = None;
            self.nav = NavRecord::new();
            self.view.query = self.spec.default_query();
            self.view.result = None;
            self.view.has_searched = false;
            self.view.error = None;
            self.view.state = ReconcileState::Empty;
            return;
        }

        debug!(namespace = %self.spec.namespace, "adopting navigated view state");
        self.view.query = decoded;
        self.view.has_searched = true;
        self.nav = nav::encode(&self.view.query);
        self.start_fetch(ReconcileState::RestoringFromNav, true);
    }

    /// Apply a resolved fetch.
    ///
    /// Responses are applied in request-issue order: anything but the latest
    /// issued request is stale and dropped, whatever its completion order.
    pub fn on_fetch_outcome(&mut self, outcome: FetchOutcome) {
        if Some(outcome.request_id) != self.latest_request {
            debug!(
                namespace = %self.spec.namespace,
                request_id = outcome.request_id,
                "discarding stale fetch response"
            );
            return;
        }
        self.latest_request = None;

        match outcome.result {
            Ok(response) => {
                let result = ViewResult::from_response(response, outcome.query.page_size);
                debug!(
                    namespace = %self.spec.namespace,
                    total = result.total_count,
                    "fetch resolved"
                );
                self.view.result = Some(result);
                self.view.error = None;
                self.view.state = ReconcileState::Idle;
                self.persist();
            }
            Err(err) => {
                // Keep the previous result; the error is presentation only.
                warn!(namespace = %self.spec.namespace, %err, "list fetch failed");
                self.view.error = Some(err.to_string());
                self.view.state = ReconcileState::Errored;
            }
        }
    }

    /// Screen teardown: cancel the pending debounce timer and mark any
    /// in-flight response stale so a late arrival is discarded, not applied.
    pub fn teardown(&mut self) {
        self.scheduler.cancel();
        self.latest_request = None;
        debug!(namespace = %self.spec.namespace, "screen torn down");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// The record the host should mirror into the address bar.
    pub fn nav_record(&self) -> &NavRecord {
        &self.nav
    }

    pub fn spec(&self) -> &ScreenSpec {
        &self.spec
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// User actions on a screen that skipped `initialize` behave as if it
    /// had mounted with empty navigation.
    fn ensure_initialized(&mut self) {
        if !self.initialized {
            self.initialize(&NavRecord::new());
        }
    }

    /// Push the current query to both external stores. The cache keeps the
    /// previous result paired with the new query until a fresh one arrives.
    fn write_through(&mut self) {
        self.nav = nav::encode(&self.view.query);
        self.persist();
    }

    fn persist(&self) {
        self.cache.save(
            &self.spec.namespace,
            &PersistedViewState {
                query: self.view.query.clone(),
                result: self.view.result.clone(),
                has_searched: self.view.has_searched,
            },
        );
    }

    /// Schedule a fetch for the current query and enter the given in-flight
    /// state. Restore states stick until the revalidation resolves, so the
    /// screen can tell a restore apart from an ordinary fetch.
    fn start_fetch(&mut self, state: ReconcileState, immediate: bool) {
        self.view.state = state;
        let request_id = self.scheduler.schedule(self.view.query.clone(), immediate);
        self.latest_request = Some(request_id);
    }
}
