//! Favorite store - the single source of truth for the favorite flag.
//!
//! A thin view over the favorite rows of a [`MovieCache`].

use std::sync::Arc;

use tracing::warn;

use crate::cache::{CacheError, CachedMovie, MovieCache};
use crate::movie::{merge_favorite_flag, Movie};

/// Get, set and list favorite movies.
#[derive(Clone)]
pub struct FavoriteStore {
    cache: Arc<dyn MovieCache>,
}

impl FavoriteStore {
    /// Create a favorite store backed by the given cache.
    pub fn new(cache: Arc<dyn MovieCache>) -> Self {
        Self { cache }
    }

    /// Whether the movie with this id is a favorite.
    ///
    /// Read failures are logged and reported as "not favorite".
    pub fn is_favorite(&self, id: i64) -> bool {
        match self.cache.is_favorite(id) {
            Ok(favorite) => favorite,
            Err(e) => {
                warn!("Failed to read favorite flag for movie {}: {}", id, e);
                false
            }
        }
    }

    /// Persist the movie's `is_favorite` flag as given.
    pub fn set_favorite(&self, movie: &Movie) -> Result<(), CacheError> {
        let record = CachedMovie::from_movie(movie).ok_or_else(|| {
            CacheError::InvalidRecord("cannot favorite a movie without an id".to_string())
        })?;
        self.cache.set_favorite(&record)
    }

    /// Flip the movie's favorite flag and return the updated movie.
    ///
    /// The current flag is read from the store, not from `movie`, so a stale
    /// copy cannot flip the flag the wrong way.
    pub fn toggle(&self, movie: &Movie) -> Result<Movie, CacheError> {
        let record = CachedMovie::from_movie(movie).ok_or_else(|| {
            CacheError::InvalidRecord("cannot favorite a movie without an id".to_string())
        })?;
        let is_favorite = self.cache.toggle_favorite(&record)?;
        Ok(merge_favorite_flag(movie.clone(), is_favorite))
    }

    /// All favorite movies, ordered by title.
    pub fn list(&self) -> Result<Vec<Movie>, CacheError> {
        Ok(self
            .cache
            .fetch_favorites()?
            .into_iter()
            .map(Movie::from)
            .collect())
    }

    /// Overlay the stored favorite flag onto a movie. Movies without an id
    /// are never favorites.
    pub fn overlay(&self, movie: Movie) -> Movie {
        let flag = movie.id.map(|id| self.is_favorite(id)).unwrap_or(false);
        merge_favorite_flag(movie, flag)
    }

    /// Overlay favorite flags onto a batch, keeping order.
    pub fn overlay_all(&self, movies: Vec<Movie>) -> Vec<Movie> {
        movies.into_iter().map(|m| self.overlay(m)).collect()
    }
}

impl std::fmt::Debug for FavoriteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoriteStore").finish_non_exhaustive()
    }
}
