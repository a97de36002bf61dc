mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviebrowser_core::{
    load_config, metrics, validate_config, Movie, MovieCache, MovieDetailsService, RemoteCatalog,
    SanitizedConfig, SearchPipeline, SearchRepository, SearchSnapshot, SearchState,
    SqliteMovieCache, TmdbClient,
};

use commands::{parse_command, Command, HELP};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so they do not interleave with results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine config path
    let config_path = std::env::var("MOVIEBROWSER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        "Effective configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let registry = Registry::new();
    for metric in metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register metrics")?;
    }

    // Create SQLite movie cache (search pages + favorites)
    let cache: Arc<dyn MovieCache> = Arc::new(
        SqliteMovieCache::new(&config.database.path).context("Failed to open movie cache")?,
    );
    info!("Movie cache initialized at {:?}", config.database.path);

    // Create remote catalog client
    let remote: Arc<dyn RemoteCatalog> = Arc::new(
        TmdbClient::new(config.catalog.client_config())
            .context("Failed to create catalog client")?,
    );
    info!("Catalog client initialized for {}", config.catalog.base_url);

    let repository = SearchRepository::new(Arc::clone(&remote), Arc::clone(&cache));
    let details = MovieDetailsService::new(remote, repository.favorites().clone());
    let pipeline = SearchPipeline::new(repository, config.search.clone());

    let app = App {
        pipeline,
        details,
        cache,
        registry,
        image_base_url: config.catalog.image_base_url.clone(),
    };

    let _subscription = app.pipeline.subscribe_with(render_snapshot);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C");
                break;
            }
        };

        // EOF
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => app.handle(command).await,
            Err(e) => println!("{:#}", e),
        }
    }

    info!("Shutting down");
    Ok(())
}

struct App {
    pipeline: SearchPipeline,
    details: MovieDetailsService,
    cache: Arc<dyn MovieCache>,
    registry: Registry,
    image_base_url: String,
}

impl App {
    async fn handle(&self, command: Command) {
        match command {
            Command::Query(text) => self.pipeline.update_query(&text),
            Command::More(index) => self.pipeline.load_next_page_if_needed(index),
            Command::Refresh => self.pipeline.refresh(),
            Command::Favorite(id) => self.toggle_favorite(id).await,
            Command::Favorites => match self.pipeline.favorites().list() {
                Ok(movies) if movies.is_empty() => println!("No favorites yet"),
                Ok(movies) => {
                    for movie in &movies {
                        println!("{}", format_row(None, movie));
                    }
                }
                Err(e) => {
                    warn!("Failed to list favorites: {}", e);
                    println!("Could not read favorites");
                }
            },
            Command::Details(id) => match self.details.details(id).await {
                Ok(movie) => self.print_details(&movie),
                Err(e) => println!("{}", e.user_message()),
            },
            Command::Stats => match self.cache.stats() {
                Ok(stats) => println!(
                    "{}",
                    serde_json::to_string_pretty(&stats).unwrap_or_default()
                ),
                Err(e) => println!("Could not read cache statistics: {}", e),
            },
            Command::Metrics => self.print_metrics(),
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }

    async fn toggle_favorite(&self, id: i64) {
        // Prefer the row on screen; fall back to the catalog for other ids
        let movie = match self.pipeline.rows().into_iter().find(|m| m.id == Some(id)) {
            Some(movie) => movie,
            None => match self.details.details(id).await {
                Ok(movie) => movie,
                Err(e) => {
                    println!("{}", e.user_message());
                    return;
                }
            },
        };

        match self.pipeline.toggle_favorite(&movie) {
            Ok(updated) if updated.is_favorite => {
                println!("Added {} to favorites", display_title(&updated))
            }
            Ok(updated) => println!("Removed {} from favorites", display_title(&updated)),
            Err(e) => {
                warn!("Failed to toggle favorite for movie {}: {}", id, e);
                println!("Could not update favorite");
            }
        }
    }

    fn print_details(&self, movie: &Movie) {
        println!("{}", format_row(None, movie));
        if let Some(language) = &movie.original_language {
            println!("  Language: {}", language);
        }
        if let Some(vote) = movie.vote_average {
            println!("  Rating:   {:.1}", vote);
        }
        if let Some(url) = movie.poster_url(&self.image_base_url) {
            println!("  Poster:   {}", url);
        }
        if let Some(overview) = movie.overview.as_deref().filter(|o| !o.is_empty()) {
            println!("  {}", overview);
        }
    }

    fn print_metrics(&self) {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            warn!("Failed to encode metrics: {}", e);
            return;
        }
        print!("{}", String::from_utf8_lossy(&buffer));
    }
}

fn render_snapshot(snapshot: &SearchSnapshot) {
    match &snapshot.state {
        SearchState::Idle => {}
        SearchState::Initial => println!("Keep typing..."),
        SearchState::Loading => println!("Searching for '{}'...", snapshot.query),
        SearchState::Error { message } => println!("{}", message),
        SearchState::Empty | SearchState::Loaded { .. } => {
            println!("{}", snapshot.headline());
            if snapshot.offline {
                println!("(offline - showing saved results)");
            }
            for (index, movie) in snapshot.rows.iter().enumerate() {
                println!("{}", format_row(Some(index), movie));
            }
            if snapshot.state == (SearchState::Loaded { has_more: true }) {
                println!("More results available (:more <index>)");
            }
        }
    }
}

fn format_row(index: Option<usize>, movie: &Movie) -> String {
    let prefix = index.map(|i| format!("[{:>3}] ", i)).unwrap_or_default();
    let year = movie.year().map(|y| format!(" ({})", y)).unwrap_or_default();
    let star = if movie.is_favorite { " *" } else { "" };
    let id = movie.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    format!("{}#{} {}{}{}", prefix, id, display_title(movie), year, star)
}

fn display_title(movie: &Movie) -> &str {
    movie.title.as_deref().unwrap_or("Untitled")
}
