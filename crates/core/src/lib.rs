pub mod cache;
pub mod config;
pub mod details;
pub mod favorites;
pub mod metrics;
pub mod movie;
pub mod remote;
pub mod search;
pub mod testing;

pub use cache::{CacheError, CacheStats, CachedMovie, MovieCache, SqliteMovieCache};
pub use config::{
    load_config, load_config_from_str, validate_config, CatalogConfig, Config, ConfigError,
    DatabaseConfig, SanitizedConfig, SearchConfig,
};
pub use details::MovieDetailsService;
pub use favorites::FavoriteStore;
pub use movie::{merge_favorite_flag, Movie, SearchPage};
pub use remote::{NetworkError, RemoteCatalog, TmdbClient, TmdbConfig};
pub use search::{
    MovieError, ResultSource, SearchPipeline, SearchRepository, SearchResult, SearchSnapshot,
    SearchState, Subscription,
};
