//! Remote movie catalog integration.
//!
//! The search pipeline only talks to the catalog through [`RemoteCatalog`],
//! so tests can swap in [`crate::testing::MockRemoteCatalog`].

mod tmdb;

pub use tmdb::{TmdbClient, TmdbConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::movie::{Movie, SearchPage};

/// Classified failure of a catalog request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// No connectivity (connection refused, DNS failure, offline).
    #[error("No internet connection")]
    NoInternet,

    /// The request did not complete within the client timeout.
    #[error("The request timed out")]
    TimedOut,

    /// The request was cancelled before it completed.
    #[error("The request was cancelled")]
    Cancelled,

    /// The catalog answered with a non-success status.
    #[error("Server error {code}: {}", message.as_deref().unwrap_or("no message"))]
    Server { code: u16, message: Option<String> },

    /// The response body could not be decoded.
    #[error("Decoding failed: {0}")]
    Decoding(String),

    /// Anything else.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl NetworkError {
    /// Whether this failure means the catalog is unreachable, in which case
    /// cached results may stand in for a fresh response.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, NetworkError::NoInternet | NetworkError::TimedOut)
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::TimedOut
        } else if e.is_connect() {
            NetworkError::NoInternet
        } else if e.is_decode() {
            NetworkError::Decoding(e.to_string())
        } else if let Some(status) = e.status() {
            NetworkError::Server {
                code: status.as_u16(),
                message: None,
            }
        } else {
            NetworkError::Unknown(e.to_string())
        }
    }
}

/// A movie catalog reachable over the network.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Search movies by free text. `page` is 1-based.
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, NetworkError>;

    /// Fetch a single movie by catalog id.
    async fn details(&self, id: i64) -> Result<Movie, NetworkError>;
}
