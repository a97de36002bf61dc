//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the remote catalog plus fixtures, allowing
//! the search pipeline to be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use moviebrowser_core::cache::SqliteMovieCache;
//! use moviebrowser_core::search::{SearchPipeline, SearchRepository};
//! use moviebrowser_core::testing::{fixtures, MockRemoteCatalog};
//!
//! let remote = Arc::new(MockRemoteCatalog::new());
//! remote.set_page("heat", fixtures::search_page(1, Some(1), vec![fixtures::movie(1, "Heat")])).await;
//!
//! let cache = Arc::new(SqliteMovieCache::in_memory()?);
//! let pipeline = SearchPipeline::new(SearchRepository::new(remote, cache), Default::default());
//! pipeline.update_query("heat");
//! ```

mod mock_remote_catalog;

pub use mock_remote_catalog::{MockRemoteCatalog, RecordedCatalogQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::movie::{Movie, SearchPage};

    /// Create a test movie with reasonable defaults.
    pub fn movie(id: i64, title: &str) -> Movie {
        Movie {
            release_date_text: Some("2001-05-16".to_string()),
            poster_path: Some(format!("/poster-{}.jpg", id)),
            original_language: Some("en".to_string()),
            vote_average: Some(7.5),
            overview: Some(format!("Overview of {}", title)),
            adult: Some(false),
            ..Movie::new(id, title)
        }
    }

    /// Create `count` movies with consecutive ids starting at `first_id`,
    /// titled "<prefix> <id>".
    pub fn numbered_movies(first_id: i64, count: usize, prefix: &str) -> Vec<Movie> {
        (first_id..)
            .take(count)
            .map(|id| movie(id, &format!("{} {}", prefix, id)))
            .collect()
    }

    /// Create a search page. `total_results` is left unset.
    pub fn search_page(page: u32, total_pages: Option<u32>, items: Vec<Movie>) -> SearchPage {
        SearchPage {
            items,
            page,
            total_pages,
            total_results: None,
        }
    }
}
