//! TMDB (The Movie Database) API client.
//!
//! Authenticates with a v4 read access token sent as a Bearer header.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, error};

use super::{NetworkError, RemoteCatalog};
use crate::metrics;
use crate::movie::{Movie, SearchPage};

/// TMDB client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// API base URL, e.g. https://api.themoviedb.org/3.
    pub base_url: String,
    /// Bearer token.
    pub api_token: String,
    /// Value of the `language` query parameter.
    pub language: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_token: String,
    language: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NetworkError::Unknown(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token,
            language: config.language,
        })
    }

    /// Turn a non-success response into a classified error.
    async fn check_status(response: Response) -> Result<Response, NetworkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<TmdbErrorBody>(&body) {
            Ok(error_body) => Some(error_body.status_message),
            Err(_) => {
                debug!("TMDB returned {} with unparsed body: {}", status, body);
                None
            }
        };

        Err(NetworkError::Server {
            code: status.as_u16(),
            message,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, NetworkError> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            let preview = String::from_utf8_lossy(&body[..body.len().min(2000)]).into_owned();
            error!(
                "Failed to decode TMDB {} response: {} (body preview: {})",
                what, e, preview
            );
            NetworkError::Decoding(e.to_string())
        })
    }
}

#[async_trait]
impl RemoteCatalog for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, NetworkError> {
        let url = format!("{}/search/movie", self.base_url);

        debug!("TMDB movie search: query='{}', page={}", query, page);

        let page_param = page.to_string();
        let started = Instant::now();
        let result: Result<SearchPage, NetworkError> = async {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_token)
                .query(&[
                    ("query", query),
                    ("page", page_param.as_str()),
                    ("include_adult", "false"),
                    ("language", self.language.as_str()),
                ])
                .send()
                .await?;

            let response = Self::check_status(response).await?;
            let search: TmdbSearchResponse = Self::decode(response, "search").await?;
            Ok(search.into_page(page))
        }
        .await;

        metrics::REMOTE_REQUEST_DURATION
            .with_label_values(&["search"])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn details(&self, id: i64) -> Result<Movie, NetworkError> {
        let url = format!("{}/movie/{}", self.base_url, id);

        debug!("TMDB get movie: id={}", id);

        let started = Instant::now();
        let result: Result<Movie, NetworkError> = async {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_token)
                .query(&[("language", self.language.as_str())])
                .send()
                .await?;

            let response = Self::check_status(response).await?;
            let details: TmdbMovieDetails = Self::decode(response, "details").await?;
            Ok(details.into())
        }
        .await;

        metrics::REMOTE_REQUEST_DURATION
            .with_label_values(&["details"])
            .observe(started.elapsed().as_secs_f64());

        result
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbErrorBody {
    status_message: String,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    page: Option<u32>,
    #[serde(default)]
    results: Vec<TmdbMovieResult>,
    total_pages: Option<u32>,
    total_results: Option<u32>,
}

impl TmdbSearchResponse {
    fn into_page(self, requested_page: u32) -> SearchPage {
        SearchPage {
            items: self.results.into_iter().map(Movie::from).collect(),
            page: self.page.unwrap_or(requested_page),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: Option<i64>,
    title: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    original_language: Option<String>,
    vote_average: Option<f64>,
    overview: Option<String>,
    adult: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: Option<i64>,
    title: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    original_language: Option<String>,
    vote_average: Option<f64>,
    overview: Option<String>,
    adult: Option<bool>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<TmdbMovieResult> for Movie {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            release_date_text: r.release_date,
            poster_path: r.poster_path,
            original_language: r.original_language,
            vote_average: r.vote_average,
            overview: r.overview,
            adult: r.adult,
            is_favorite: false,
        }
    }
}

impl From<TmdbMovieDetails> for Movie {
    fn from(d: TmdbMovieDetails) -> Self {
        Self {
            id: d.id,
            title: d.title,
            release_date_text: d.release_date,
            poster_path: d.poster_path,
            original_language: d.original_language,
            vote_average: d.vote_average,
            overview: d.overview,
            adult: d.adult,
            is_favorite: false,
        }
    }
}
