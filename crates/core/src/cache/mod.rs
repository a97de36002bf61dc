//! Movie cache - durable storage for search result pages and favorites.
//!
//! Pages are stored per (query, page) key so searches can fall back to them
//! when the catalog is unreachable. Favorites live on the same rows plus a
//! dedicated anchor row per movie that survives page refreshes.

mod sqlite;
mod types;

pub use sqlite::SqliteMovieCache;
pub use types::*;

/// Trait for movie cache storage.
///
/// Implementations serialize writes internally; callers never lock.
pub trait MovieCache: Send + Sync {
    /// Replace every row stored under the exact (query, page) key.
    ///
    /// Ids already known as favorites are written with the favorite flag set,
    /// whatever the incoming records say. Rows under other keys and favorite
    /// anchors are untouched.
    fn save(&self, records: &[CachedMovie], query: &str, page: u32) -> Result<(), CacheError>;

    /// All rows for the exact (query, page) key, ordered by title.
    ///
    /// Returns an empty vector when nothing is cached.
    fn fetch(&self, query: &str, page: u32) -> Result<Vec<CachedMovie>, CacheError>;

    /// Set the favorite flag of a movie.
    ///
    /// Updates every stored row with that id and maintains the favorite
    /// anchor. Anchor metadata is only filled where it is still empty.
    fn set_favorite(&self, record: &CachedMovie) -> Result<(), CacheError>;

    /// Flip the stored favorite flag of `record.id` and return the new value.
    ///
    /// The read and the write happen atomically, so concurrent toggles of the
    /// same id are never lost. `record.is_favorite` is ignored.
    fn toggle_favorite(&self, record: &CachedMovie) -> Result<bool, CacheError>;

    /// All favorite movies, one per id, ordered by title.
    fn fetch_favorites(&self) -> Result<Vec<CachedMovie>, CacheError>;

    /// Whether any stored row marks this id as favorite.
    fn is_favorite(&self, id: i64) -> Result<bool, CacheError>;

    /// Delete every cached page of a query. Returns the number of rows removed.
    fn clear_query(&self, query: &str) -> Result<u64, CacheError>;

    /// Get cache statistics.
    fn stats(&self) -> Result<CacheStats, CacheError>;
}
