//! User-facing error taxonomy of the search and details flows.

use thiserror::Error;

use crate::remote::NetworkError;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MovieError {
    #[error("no internet connection")]
    NoInternet,

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("server error: {0}")]
    Server(String),

    #[error("response could not be decoded")]
    Decoding,

    #[error("unknown error")]
    Unknown,

    #[error("not found")]
    NotFound,
}

impl MovieError {
    /// Stable, human-readable message for display.
    pub fn user_message(&self) -> String {
        match self {
            MovieError::NoInternet => {
                "No internet connection and no offline results are available.".to_string()
            }
            MovieError::Timeout => "The request timed out. Please try again.".to_string(),
            MovieError::Cancelled => "The request was cancelled.".to_string(),
            MovieError::Server(message) => message.clone(),
            MovieError::Decoding | MovieError::Unknown => "Something went wrong.".to_string(),
            MovieError::NotFound => "Result not found".to_string(),
        }
    }
}

impl From<NetworkError> for MovieError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::NoInternet => MovieError::NoInternet,
            NetworkError::TimedOut => MovieError::Timeout,
            NetworkError::Cancelled => MovieError::Cancelled,
            NetworkError::Server { message, .. } => {
                MovieError::Server(message.unwrap_or_else(|| "Server error".to_string()))
            }
            NetworkError::Decoding(_) => MovieError::Decoding,
            NetworkError::Unknown(_) => MovieError::Unknown,
        }
    }
}
