//! Mock remote catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::movie::{Movie, SearchPage};
use crate::remote::{NetworkError, RemoteCatalog};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogQuery {
    Search { query: String, page: u32 },
    Details { id: i64 },
}

/// Mock implementation of the RemoteCatalog trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable pages and movie details
/// - Track queries for assertions
/// - Simulate failures, lost connectivity and slow responses
///
/// Queries are recorded when the call starts, before any simulated latency.
///
/// # Example
///
/// ```rust,ignore
/// use moviebrowser_core::testing::{MockRemoteCatalog, fixtures};
///
/// let catalog = MockRemoteCatalog::new();
/// catalog
///     .set_page("heat", fixtures::search_page(1, Some(1), vec![fixtures::movie(1, "Heat")]))
///     .await;
///
/// let page = catalog.search("heat", 1).await?;
/// assert_eq!(page.items.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockRemoteCatalog {
    /// Search pages by (query, page).
    pages: Arc<RwLock<HashMap<(String, u32), SearchPage>>>,
    /// Movie details by ID.
    movies: Arc<RwLock<HashMap<i64, Movie>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<NetworkError>>>,
    /// When true every operation fails with `NoInternet`.
    offline: Arc<RwLock<bool>>,
    /// Delay applied to every operation.
    latency: Arc<RwLock<Duration>>,
}

impl Default for MockRemoteCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteCatalog {
    /// Create a new empty mock remote catalog.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            movies: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            offline: Arc::new(RwLock::new(false)),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Serve `page` for `query` at `page.page`.
    pub async fn set_page(&self, query: &str, page: SearchPage) {
        self.pages
            .write()
            .await
            .insert((query.to_string(), page.page), page);
    }

    /// Serve `movie` from `details`. The movie must have an id.
    pub async fn add_movie(&self, movie: Movie) {
        if let Some(id) = movie.id {
            self.movies.write().await.insert(id, movie);
        }
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: NetworkError) {
        *self.next_error.write().await = Some(error);
    }

    /// Simulate lost (or restored) connectivity.
    pub async fn set_offline(&self, offline: bool) {
        *self.offline.write().await = offline;
    }

    /// Delay every following operation.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Get the (query, page) pairs of every search, in call order.
    pub async fn recorded_calls(&self) -> Vec<(String, u32)> {
        self.queries
            .read()
            .await
            .iter()
            .filter_map(|q| match q {
                RecordedCatalogQuery::Search { query, page } => Some((query.clone(), *page)),
                RecordedCatalogQuery::Details { .. } => None,
            })
            .collect()
    }

    /// Number of searches started so far.
    pub async fn search_count(&self) -> usize {
        self.recorded_calls().await.len()
    }

    /// Clear recorded queries.
    pub async fn clear_queries(&self) {
        self.queries.write().await.clear();
    }

    async fn begin(&self, query: RecordedCatalogQuery) -> Result<(), NetworkError> {
        self.queries.write().await.push(query);

        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if *self.offline.read().await {
            return Err(NetworkError::NoInternet);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCatalog for MockRemoteCatalog {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, NetworkError> {
        self.begin(RecordedCatalogQuery::Search {
            query: query.to_string(),
            page,
        })
        .await?;

        let pages = self.pages.read().await;
        Ok(pages
            .get(&(query.to_string(), page))
            .cloned()
            .unwrap_or(SearchPage {
                items: Vec::new(),
                page,
                total_pages: Some(0),
                total_results: Some(0),
            }))
    }

    async fn details(&self, id: i64) -> Result<Movie, NetworkError> {
        self.begin(RecordedCatalogQuery::Details { id }).await?;

        self.movies
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(NetworkError::Server {
                code: 404,
                message: Some("The resource you requested could not be found.".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_unknown_page_is_empty() {
        let catalog = MockRemoteCatalog::new();
        let page = catalog.search("nothing", 2).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page, 2);
        assert_eq!(page.has_more(), Some(false));
    }

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let catalog = MockRemoteCatalog::new();
        catalog.set_next_error(NetworkError::TimedOut).await;

        assert_eq!(
            catalog.search("heat", 1).await.unwrap_err(),
            NetworkError::TimedOut
        );
        assert!(catalog.search("heat", 1).await.is_ok());
        assert_eq!(catalog.search_count().await, 2);
    }

    #[tokio::test]
    async fn test_details_and_recording() {
        let catalog = MockRemoteCatalog::new();
        catalog.add_movie(fixtures::movie(7, "Se7en")).await;

        assert_eq!(
            catalog.details(7).await.unwrap().title.as_deref(),
            Some("Se7en")
        );
        assert!(matches!(
            catalog.details(8).await,
            Err(NetworkError::Server { code: 404, .. })
        ));
        assert_eq!(
            catalog.recorded_queries().await,
            vec![
                RecordedCatalogQuery::Details { id: 7 },
                RecordedCatalogQuery::Details { id: 8 },
            ]
        );
        assert_eq!(catalog.search_count().await, 0);
    }
}
