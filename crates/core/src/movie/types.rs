//! Movie and search page types.

use serde::{Deserialize, Serialize};

/// A movie as seen by the application.
///
/// `is_favorite` is not part of the remote representation. It is overlaid
/// from the favorite store before a movie reaches a consumer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movie {
    /// Catalog identifier. Only absent for malformed catalog entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Movie title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Release date as sent by the catalog (usually YYYY-MM-DD, not validated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date_text: Option<String>,
    /// Poster path relative to the image base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// ISO 639-1 code of the original language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    /// Movie overview/synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Adult content flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult: Option<bool>,
    /// Whether the user marked this movie as a favorite.
    #[serde(default)]
    pub is_favorite: bool,
}

impl Movie {
    /// Create a movie with just an id and a title.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Full poster URL for the given image base, if the movie has a poster.
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        let path = self.poster_path.as_deref()?.trim_matches('/');
        if path.is_empty() {
            return None;
        }
        Some(format!("{}/{}", image_base_url.trim_end_matches('/'), path))
    }

    /// Release year parsed from the release date text.
    pub fn year(&self) -> Option<u32> {
        self.release_date_text
            .as_ref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

/// Identity is the catalog id when both sides have one.
impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.id == other.id
                    && self.title == other.title
                    && self.release_date_text == other.release_date_text
                    && self.poster_path == other.poster_path
                    && self.original_language == other.original_language
                    && self.vote_average == other.vote_average
                    && self.overview == other.overview
                    && self.adult == other.adult
                    && self.is_favorite == other.is_favorite
            }
        }
    }
}

/// Overlay a favorite flag onto a movie.
pub fn merge_favorite_flag(movie: Movie, is_favorite: bool) -> Movie {
    Movie {
        is_favorite,
        ..movie
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Results in server order.
    pub items: Vec<Movie>,
    /// Page number (1-based).
    pub page: u32,
    /// Total number of pages, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    /// Total number of results, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u32>,
}

impl SearchPage {
    /// Whether more pages follow this one. `None` when the total is unknown.
    pub fn has_more(&self) -> Option<bool> {
        self.total_pages.map(|total| self.page < total)
    }
}
