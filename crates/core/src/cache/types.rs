//! Types for the movie cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::movie::Movie;

/// Query value reserved for favorite anchor rows. Anchors use page 0, which
/// no real search page can have.
pub const FAVORITE_ANCHOR_QUERY: &str = "__favorite__";

/// A cached movie row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMovie {
    /// Catalog id.
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adult: Option<bool>,
    pub is_favorite: bool,
}

impl CachedMovie {
    /// Build a cache row from a movie. Movies without an id cannot be cached.
    pub fn from_movie(movie: &Movie) -> Option<Self> {
        Some(Self {
            id: movie.id?,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            release_date_text: movie.release_date_text.clone(),
            overview: movie.overview.clone(),
            vote_average: movie.vote_average,
            original_language: movie.original_language.clone(),
            adult: movie.adult,
            is_favorite: movie.is_favorite,
        })
    }
}

impl From<CachedMovie> for Movie {
    fn from(c: CachedMovie) -> Self {
        Self {
            id: Some(c.id),
            title: c.title,
            release_date_text: c.release_date_text,
            poster_path: c.poster_path,
            original_language: c.original_language,
            vote_average: c.vote_average,
            overview: c.overview,
            adult: c.adult,
            is_favorite: c.is_favorite,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Rows stored under real search keys.
    pub paged_rows: u64,
    /// Distinct queries with at least one cached page.
    pub cached_queries: u64,
    /// Distinct favorite ids.
    pub favorites: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<DateTime<Utc>>,
}

/// Errors for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_movie_requires_id() {
        let movie = Movie {
            title: Some("No id".to_string()),
            ..Default::default()
        };
        assert!(CachedMovie::from_movie(&movie).is_none());
    }

    #[test]
    fn test_movie_conversion_keeps_metadata() {
        let movie = Movie {
            poster_path: Some("/p.jpg".to_string()),
            vote_average: Some(6.5),
            is_favorite: true,
            ..Movie::new(42, "Heat")
        };
        let cached = CachedMovie::from_movie(&movie).unwrap();
        assert_eq!(cached.id, 42);
        assert!(cached.is_favorite);

        let back: Movie = cached.into();
        assert_eq!(back.poster_path.as_deref(), Some("/p.jpg"));
        assert_eq!(back.vote_average, Some(6.5));
        assert!(back.is_favorite);
    }

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            paged_rows: 20,
            cached_queries: 2,
            favorites: 1,
            oldest_entry: None,
            newest_entry: Some(Utc::now()),
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(!json.contains("oldest_entry"));
        assert!(json.contains("newest_entry"));
    }
}
