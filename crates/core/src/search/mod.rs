//! Incremental movie search.
//!
//! [`SearchPipeline`] turns query edits and scroll positions into a
//! published [`SearchSnapshot`]; [`SearchRepository`] does the actual fetch
//! with offline fallback and favorite overlay.

mod error;
mod pipeline;
mod repository;
mod state;

pub use error::MovieError;
pub use pipeline::SearchPipeline;
pub use repository::{ResultSource, SearchRepository, SearchResult};
pub use state::{SearchSnapshot, SearchState, Subscription};
