//! Single-movie details with the favorite flag applied.

use std::sync::Arc;

use tracing::{debug, error};

use crate::cache::CacheError;
use crate::favorites::FavoriteStore;
use crate::movie::Movie;
use crate::remote::{NetworkError, RemoteCatalog};
use crate::search::MovieError;

/// Fetches movie details and toggles favorites from the details screen.
#[derive(Clone)]
pub struct MovieDetailsService {
    remote: Arc<dyn RemoteCatalog>,
    favorites: FavoriteStore,
}

impl MovieDetailsService {
    pub fn new(remote: Arc<dyn RemoteCatalog>, favorites: FavoriteStore) -> Self {
        Self { remote, favorites }
    }

    /// Fetch the details of a movie. Details are never served from the cache.
    pub async fn details(&self, id: i64) -> Result<Movie, MovieError> {
        match self.remote.details(id).await {
            Ok(movie) => Ok(self.favorites.overlay(movie)),
            Err(NetworkError::Server { code: 404, .. }) => {
                debug!("Movie {} not found in catalog", id);
                Err(MovieError::NotFound)
            }
            Err(e) => {
                if let NetworkError::Decoding(detail) = &e {
                    error!("Details for movie {} could not be decoded: {}", id, detail);
                }
                Err(e.into())
            }
        }
    }

    /// Flip the favorite flag and return the updated movie.
    pub fn toggle_favorite(&self, movie: &Movie) -> Result<Movie, CacheError> {
        self.favorites.toggle(movie)
    }
}

impl std::fmt::Debug for MovieDetailsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovieDetailsService").finish_non_exhaustive()
    }
}
