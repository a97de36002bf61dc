//! Read-through/write-through access to search results.
//!
//! Fresh pages come from the remote catalog, get their favorite flags
//! overlaid and are written to the cache. When the catalog is unreachable
//! the cached copy of the same (query, page) is served instead.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::MovieError;
use crate::cache::{CachedMovie, MovieCache};
use crate::favorites::FavoriteStore;
use crate::metrics;
use crate::movie::{Movie, SearchPage};
use crate::remote::{NetworkError, RemoteCatalog};

/// Where a page of results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Remote,
    Cache,
}

/// A page of results with favorite flags applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub page: SearchPage,
    pub source: ResultSource,
}

/// Search access combining the remote catalog, the cache and the favorite
/// store.
#[derive(Clone)]
pub struct SearchRepository {
    remote: Arc<dyn RemoteCatalog>,
    cache: Arc<dyn MovieCache>,
    favorites: FavoriteStore,
}

impl SearchRepository {
    /// Create a repository. The favorite store is built on the same cache.
    pub fn new(remote: Arc<dyn RemoteCatalog>, cache: Arc<dyn MovieCache>) -> Self {
        let favorites = FavoriteStore::new(Arc::clone(&cache));
        Self {
            remote,
            cache,
            favorites,
        }
    }

    /// The favorite store sharing this repository's cache.
    pub fn favorites(&self) -> &FavoriteStore {
        &self.favorites
    }

    /// Search one page.
    ///
    /// Connectivity failures fall back to the cache; any other failure is
    /// returned without consulting it.
    pub async fn search(&self, query: &str, page: u32) -> Result<SearchResult, MovieError> {
        match self.remote.search(query, page).await {
            Ok(remote_page) => {
                let items = self.favorites.overlay_all(remote_page.items);
                self.persist(&items, query, page);
                Ok(SearchResult {
                    page: SearchPage {
                        items,
                        ..remote_page
                    },
                    source: ResultSource::Remote,
                })
            }
            Err(e) if e.is_connectivity() => self.fallback(query, page, e),
            Err(e) => {
                if let NetworkError::Decoding(detail) = &e {
                    error!(
                        "Search for '{}' page {} returned an undecodable response: {}",
                        query, page, detail
                    );
                }
                Err(e.into())
            }
        }
    }

    fn persist(&self, items: &[Movie], query: &str, page: u32) {
        let records: Vec<CachedMovie> = items.iter().filter_map(CachedMovie::from_movie).collect();
        if let Err(e) = self.cache.save(&records, query, page) {
            metrics::CACHE_WRITE_FAILURES.inc();
            warn!(
                "Failed to cache search results for '{}' page {}: {}",
                query, page, e
            );
        }
    }

    fn fallback(
        &self,
        query: &str,
        page: u32,
        cause: NetworkError,
    ) -> Result<SearchResult, MovieError> {
        let cached = match self.cache.fetch(query, page) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to read cached results for '{}' page {}: {}", query, page, e);
                Vec::new()
            }
        };

        if cached.is_empty() {
            metrics::CACHE_FALLBACKS.with_label_values(&["miss"]).inc();
            debug!(
                "No cached results for '{}' page {} after: {}",
                query, page, cause
            );
            return Err(cause.into());
        }

        metrics::CACHE_FALLBACKS.with_label_values(&["hit"]).inc();
        warn!(
            "Serving {} cached results for '{}' page {} ({})",
            cached.len(),
            query,
            page,
            cause
        );

        let items = self
            .favorites
            .overlay_all(cached.into_iter().map(Movie::from).collect());

        Ok(SearchResult {
            page: SearchPage {
                items,
                page,
                total_pages: None,
                total_results: None,
            },
            source: ResultSource::Cache,
        })
    }
}

impl std::fmt::Debug for SearchRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchRepository").finish_non_exhaustive()
    }
}
