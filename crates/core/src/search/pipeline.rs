//! Debounced, single-flight search session.
//!
//! One [`SearchPipeline`] backs one search screen. Query edits are coalesced
//! behind a quiet period, at most one search task is alive at a time, and a
//! result is applied only if its task is still the current one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::repository::{ResultSource, SearchRepository, SearchResult};
use super::state::{SearchSnapshot, SearchState, Subscription};
use super::MovieError;
use crate::cache::CacheError;
use crate::config::SearchConfig;
use crate::favorites::FavoriteStore;
use crate::metrics;
use crate::movie::Movie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchKind {
    /// Replaces the rows; entered through `Loading`.
    FirstPage,
    /// Appends to the rows while the state stays `Loaded`.
    NextPage,
}

impl SearchKind {
    fn label(self) -> &'static str {
        match self {
            SearchKind::FirstPage => "first_page",
            SearchKind::NextPage => "next_page",
        }
    }
}

/// The scheduled or in-flight search. There is at most one.
#[derive(Debug)]
struct ActiveTask {
    generation: u64,
    kind: SearchKind,
    token: CancellationToken,
}

#[derive(Debug, Clone)]
struct Request {
    generation: u64,
    kind: SearchKind,
    query: String,
    page: u32,
}

#[derive(Debug, Default)]
struct Session {
    query: String,
    page: u32,
    rows: Vec<Movie>,
    state: SearchState,
    offline: bool,
    total_results: Option<u32>,
    generation: u64,
    active: Option<ActiveTask>,
}

impl Session {
    fn reset(&mut self, query: String) {
        self.query = query;
        self.page = 1;
        self.rows.clear();
        self.offline = false;
        self.total_results = None;
    }

    fn cancel_active(&mut self) {
        if let Some(task) = self.active.take() {
            task.token.cancel();
            metrics::DEBOUNCE_CANCELLATIONS.inc();
            debug!(
                "Cancelled {} search (generation {})",
                task.kind.label(),
                task.generation
            );
        }
    }

    fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            page: self.page,
            state: self.state.clone(),
            rows: self.rows.clone(),
            offline: self.offline,
        }
    }
}

struct Inner {
    repository: SearchRepository,
    config: SearchConfig,
    session: Mutex<Session>,
    snapshot_tx: watch::Sender<SearchSnapshot>,
}

impl Inner {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        // Session updates never leave it half-written, so a poisoned lock is
        // still usable
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.snapshot_tx.send_replace(session.snapshot());
    }

    /// Apply a finished search if its task is still the current one.
    fn apply(&self, request: Request, result: Result<SearchResult, MovieError>) {
        let mut session = self.lock_session();

        let is_current = session
            .active
            .as_ref()
            .is_some_and(|task| task.generation == request.generation);
        if !is_current {
            metrics::SEARCH_REQUESTS
                .with_label_values(&[request.kind.label(), "discarded"])
                .inc();
            debug!(
                "Discarded stale result for '{}' page {} (generation {})",
                request.query, request.page, request.generation
            );
            return;
        }
        session.active = None;

        match result {
            Ok(SearchResult { page, source }) => {
                let offline = source == ResultSource::Cache;
                let fetched = page.items.len();
                let server_has_more = page.has_more();

                if page.total_results.is_some() {
                    session.total_results = page.total_results;
                }
                match request.kind {
                    SearchKind::FirstPage => session.rows = page.items,
                    SearchKind::NextPage => session.rows.extend(page.items),
                }
                session.offline = offline;

                let has_more = if offline || fetched == 0 {
                    false
                } else {
                    server_has_more
                        .or_else(|| {
                            session
                                .total_results
                                .map(|total| session.rows.len() < total as usize)
                        })
                        .unwrap_or(false)
                };

                session.state = if session.rows.is_empty() {
                    SearchState::Empty
                } else {
                    SearchState::Loaded { has_more }
                };

                metrics::SEARCH_REQUESTS
                    .with_label_values(&[
                        request.kind.label(),
                        if offline { "offline" } else { "online" },
                    ])
                    .inc();
                debug!(
                    "Applied {} result for '{}' page {}: {} new, {} total, has_more={}",
                    request.kind.label(),
                    request.query,
                    request.page,
                    fetched,
                    session.rows.len(),
                    has_more
                );
            }
            Err(e) => {
                if request.kind == SearchKind::NextPage {
                    // Let a later retry ask for the same page again
                    session.page = session.page.saturating_sub(1).max(1);
                }
                metrics::SEARCH_REQUESTS
                    .with_label_values(&[request.kind.label(), "error"])
                    .inc();
                info!(
                    "Search for '{}' page {} failed: {:?}",
                    request.query, request.page, e
                );
                session.state = SearchState::Error {
                    message: e.user_message(),
                };
            }
        }

        self.publish(&session);
    }
}

/// Start a task for the session's current query and page, replacing any
/// previous one.
fn schedule(inner: &Arc<Inner>, session: &mut Session, kind: SearchKind, delay: Duration) {
    session.cancel_active();
    session.generation += 1;

    let token = CancellationToken::new();
    session.active = Some(ActiveTask {
        generation: session.generation,
        kind,
        token: token.clone(),
    });

    let request = Request {
        generation: session.generation,
        kind,
        query: session.query.clone(),
        page: session.page,
    };
    tokio::spawn(run_search(
        Arc::downgrade(inner),
        inner.repository.clone(),
        request,
        delay,
        token,
    ));
}

async fn run_search(
    inner: Weak<Inner>,
    repository: SearchRepository,
    request: Request,
    delay: Duration,
    token: CancellationToken,
) {
    if !delay.is_zero() {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let result = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        result = repository.search(&request.query, request.page) => result,
    };

    // The pipeline may have been dropped while the request was in flight
    if let Some(inner) = inner.upgrade() {
        inner.apply(request, result);
    }
}

/// Incremental movie search with debounce, pagination and offline fallback.
///
/// Every method is synchronous; searches run on spawned Tokio tasks, so the
/// pipeline must be driven from within a Tokio runtime. Consumers observe
/// results through [`subscribe`](Self::subscribe) or
/// [`subscribe_with`](Self::subscribe_with).
pub struct SearchPipeline {
    inner: Arc<Inner>,
}

impl SearchPipeline {
    pub fn new(repository: SearchRepository, config: SearchConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                repository,
                config,
                session: Mutex::new(Session::default()),
                snapshot_tx,
            }),
        }
    }

    /// Handle a query edit.
    ///
    /// Empty text goes to `Idle` and text shorter than the minimum goes to
    /// `Initial`, both without a network call. Anything longer enters
    /// `Loading` and searches page 1 once the query has been quiet for the
    /// debounce period. Every edit restarts from page 1, so re-submitting
    /// the same query retries it.
    pub fn update_query(&self, text: &str) {
        let query = text.trim().to_string();
        let mut session = self.inner.lock_session();

        session.cancel_active();
        session.reset(query);

        let chars = session.query.chars().count();
        if chars == 0 {
            session.state = SearchState::Idle;
        } else if chars < self.inner.config.min_query_chars {
            session.state = SearchState::Initial;
        } else {
            session.state = SearchState::Loading;
            schedule(
                &self.inner,
                &mut session,
                SearchKind::FirstPage,
                self.inner.config.debounce(),
            );
        }

        self.inner.publish(&session);
    }

    /// Fetch the next page when the row at `index` is close to the end.
    ///
    /// Ignored unless the state is `Loaded` with more pages, the rows are not
    /// served from the offline cache, and no search is already running.
    pub fn load_next_page_if_needed(&self, index: usize) {
        let mut session = self.inner.lock_session();

        if session.state != (SearchState::Loaded { has_more: true })
            || session.offline
            || session.active.is_some()
        {
            return;
        }

        let threshold = session
            .rows
            .len()
            .saturating_sub(self.inner.config.prefetch_window);
        if index < threshold {
            return;
        }

        session.page += 1;
        debug!(
            "Row {} of {} appeared, loading page {} of '{}'",
            index,
            session.rows.len(),
            session.page,
            session.query
        );
        schedule(&self.inner, &mut session, SearchKind::NextPage, Duration::ZERO);
        self.inner.publish(&session);
    }

    /// Re-run the current query from page 1 without waiting for the debounce
    /// period. Does nothing while the query is below the minimum length.
    pub fn refresh(&self) {
        let mut session = self.inner.lock_session();

        if session.query.chars().count() < self.inner.config.min_query_chars {
            return;
        }

        let query = session.query.clone();
        session.cancel_active();
        session.reset(query);
        session.state = SearchState::Loading;
        schedule(&self.inner, &mut session, SearchKind::FirstPage, Duration::ZERO);
        self.inner.publish(&session);
    }

    /// Flip a movie's favorite flag and update the matching rows.
    pub fn toggle_favorite(&self, movie: &Movie) -> Result<Movie, CacheError> {
        let updated = self.inner.repository.favorites().toggle(movie)?;

        let mut session = self.inner.lock_session();
        let mut patched = false;
        for row in session
            .rows
            .iter_mut()
            .filter(|row| row.id.is_some() && row.id == updated.id)
        {
            row.is_favorite = updated.is_favorite;
            patched = true;
        }
        if patched {
            self.inner.publish(&session);
        }

        Ok(updated)
    }

    /// The favorite store used for overlays.
    pub fn favorites(&self) -> &FavoriteStore {
        self.inner.repository.favorites()
    }

    /// Receive every published snapshot. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Invoke `callback` with the current snapshot and every later one until
    /// the returned [`Subscription`] is dropped.
    pub fn subscribe_with<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&SearchSnapshot) + Send + 'static,
    {
        Subscription::spawn(self.subscribe(), callback)
    }

    pub fn current_state(&self) -> SearchState {
        self.inner.lock_session().state.clone()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.lock_session().snapshot()
    }

    pub fn rows(&self) -> Vec<Movie> {
        self.inner.lock_session().rows.clone()
    }
}

impl Drop for SearchPipeline {
    fn drop(&mut self) {
        self.inner.lock_session().cancel_active();
    }
}

impl std::fmt::Debug for SearchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.inner.lock_session();
        f.debug_struct("SearchPipeline")
            .field("query", &session.query)
            .field("page", &session.page)
            .field("state", &session.state)
            .field("rows", &session.rows.len())
            .finish()
    }
}
