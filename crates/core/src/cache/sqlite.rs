//! SQLite-backed movie cache implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};

use super::{CacheError, CacheStats, CachedMovie, MovieCache, FAVORITE_ANCHOR_QUERY};

const ANCHOR_PAGE: u32 = 0;

const MOVIE_COLUMNS: &str = "movie_id, title, poster_path, release_date_text, overview,
     vote_average, original_language, adult, is_favorite";

/// SQLite-backed movie cache.
pub struct SqliteMovieCache {
    conn: Mutex<Connection>,
}

impl SqliteMovieCache {
    /// Create a new SQLite cache, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite cache (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            -- One row per (query, page, movie). Favorite anchors use page 0.
            CREATE TABLE IF NOT EXISTS cached_movies (
                query TEXT NOT NULL,
                page INTEGER NOT NULL,
                movie_id INTEGER NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                title TEXT,
                poster_path TEXT,
                release_date_text TEXT,
                overview TEXT,
                vote_average REAL,
                original_language TEXT,
                adult INTEGER,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (query, page, movie_id)
            );

            CREATE INDEX IF NOT EXISTS idx_cached_movies_movie_id ON cached_movies(movie_id);
            CREATE INDEX IF NOT EXISTS idx_cached_movies_favorite ON cached_movies(is_favorite);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Internal(format!("cache connection poisoned: {}", e)))
    }

    fn row_to_cached_movie(row: &rusqlite::Row) -> rusqlite::Result<CachedMovie> {
        Ok(CachedMovie {
            id: row.get(0)?,
            title: row.get(1)?,
            poster_path: row.get(2)?,
            release_date_text: row.get(3)?,
            overview: row.get(4)?,
            vote_average: row.get(5)?,
            original_language: row.get(6)?,
            adult: row.get(7)?,
            is_favorite: row.get(8)?,
        })
    }

    fn parse_timestamp(s: Option<String>) -> Option<DateTime<Utc>> {
        s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl MovieCache for SqliteMovieCache {
    fn save(&self, records: &[CachedMovie], query: &str, page: u32) -> Result<(), CacheError> {
        if page == ANCHOR_PAGE {
            return Err(CacheError::InvalidRecord(
                "search pages start at 1".to_string(),
            ));
        }
        if query == FAVORITE_ANCHOR_QUERY {
            return Err(CacheError::InvalidRecord(format!(
                "'{}' is reserved",
                FAVORITE_ANCHOR_QUERY
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now_str = Utc::now().to_rfc3339();

        // Favorite ids must be collected before the old rows are deleted
        let favorite_ids: HashSet<i64> = {
            let mut stmt = tx.prepare(
                "SELECT 1 FROM cached_movies WHERE movie_id = ? AND is_favorite = 1 LIMIT 1",
            )?;
            let mut ids = HashSet::new();
            for record in records {
                if stmt.exists(params![record.id])? {
                    ids.insert(record.id);
                }
            }
            ids
        };

        tx.execute(
            "DELETE FROM cached_movies WHERE query = ? AND page = ?",
            params![query, page],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT OR REPLACE INTO cached_movies
                    (query, page, movie_id, position, title, poster_path, release_date_text,
                     overview, vote_average, original_language, adult, is_favorite, cached_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;

            for (position, record) in records.iter().enumerate() {
                insert.execute(params![
                    query,
                    page,
                    record.id,
                    position as i64,
                    &record.title,
                    &record.poster_path,
                    &record.release_date_text,
                    &record.overview,
                    record.vote_average,
                    &record.original_language,
                    record.adult,
                    favorite_ids.contains(&record.id),
                    &now_str,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn fetch(&self, query: &str, page: u32) -> Result<Vec<CachedMovie>, CacheError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cached_movies
             WHERE query = ?1 AND page = ?2
             ORDER BY title ASC, movie_id ASC",
            MOVIE_COLUMNS
        ))?;

        let rows = stmt.query_map(params![query, page], Self::row_to_cached_movie)?;

        let mut movies = Vec::new();
        for row in rows {
            movies.push(row?);
        }
        Ok(movies)
    }

    fn set_favorite(&self, record: &CachedMovie) -> Result<(), CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_favorite(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    fn toggle_favorite(&self, record: &CachedMovie) -> Result<bool, CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let current = is_favorite_in(&tx, record.id)?;
        let flipped = CachedMovie {
            is_favorite: !current,
            ..record.clone()
        };
        write_favorite(&tx, &flipped)?;

        tx.commit()?;
        Ok(flipped.is_favorite)
    }

    fn fetch_favorites(&self) -> Result<Vec<CachedMovie>, CacheError> {
        let conn = self.lock()?;

        // Anchors (page 0) sort first so they win the per-id dedup
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cached_movies
             WHERE is_favorite = 1
             ORDER BY movie_id ASC, page ASC",
            MOVIE_COLUMNS
        ))?;

        let rows = stmt.query_map([], Self::row_to_cached_movie)?;

        let mut seen = HashSet::new();
        let mut favorites = Vec::new();
        for row in rows {
            let movie = row?;
            if seen.insert(movie.id) {
                favorites.push(movie);
            }
        }

        favorites.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(favorites)
    }

    fn is_favorite(&self, id: i64) -> Result<bool, CacheError> {
        let conn = self.lock()?;
        is_favorite_in(&conn, id)
    }

    fn clear_query(&self, query: &str) -> Result<u64, CacheError> {
        let conn = self.lock()?;

        let rows_affected = conn.execute(
            "DELETE FROM cached_movies WHERE query = ? AND page > ?",
            params![query, ANCHOR_PAGE],
        )?;

        Ok(rows_affected as u64)
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.lock()?;

        let paged_rows: u64 = conn.query_row(
            "SELECT COUNT(*) FROM cached_movies WHERE page > 0",
            [],
            |row| row.get(0),
        )?;

        let cached_queries: u64 = conn.query_row(
            "SELECT COUNT(DISTINCT query) FROM cached_movies WHERE page > 0",
            [],
            |row| row.get(0),
        )?;

        let favorites: u64 = conn.query_row(
            "SELECT COUNT(DISTINCT movie_id) FROM cached_movies WHERE is_favorite = 1",
            [],
            |row| row.get(0),
        )?;

        let oldest_entry = Self::parse_timestamp(conn.query_row(
            "SELECT MIN(cached_at) FROM cached_movies WHERE page > 0",
            [],
            |row| row.get(0),
        )?);

        let newest_entry = Self::parse_timestamp(conn.query_row(
            "SELECT MAX(cached_at) FROM cached_movies WHERE page > 0",
            [],
            |row| row.get(0),
        )?);

        Ok(CacheStats {
            paged_rows,
            cached_queries,
            favorites,
            oldest_entry,
            newest_entry,
        })
    }
}

/// Write a favorite flag inside an open transaction.
fn write_favorite(tx: &Transaction<'_>, record: &CachedMovie) -> Result<(), CacheError> {
    let now_str = Utc::now().to_rfc3339();

    tx.execute(
        "UPDATE cached_movies SET is_favorite = ? WHERE movie_id = ?",
        params![record.is_favorite, record.id],
    )?;

    let anchor_exists = tx
        .prepare("SELECT 1 FROM cached_movies WHERE query = ? AND page = ? AND movie_id = ?")?
        .exists(params![FAVORITE_ANCHOR_QUERY, ANCHOR_PAGE, record.id])?;

    if anchor_exists {
        // Metadata is first-write-wins, the flag always follows the caller
        tx.execute(
            "UPDATE cached_movies SET
                is_favorite = ?4,
                title = CASE WHEN title IS NULL OR title = '' THEN ?5 ELSE title END,
                poster_path = CASE WHEN poster_path IS NULL OR poster_path = '' THEN ?6 ELSE poster_path END,
                release_date_text = CASE WHEN release_date_text IS NULL OR release_date_text = '' THEN ?7 ELSE release_date_text END,
                overview = CASE WHEN overview IS NULL OR overview = '' THEN ?8 ELSE overview END,
                vote_average = COALESCE(vote_average, ?9),
                original_language = CASE WHEN original_language IS NULL OR original_language = '' THEN ?10 ELSE original_language END,
                adult = COALESCE(adult, ?11),
                cached_at = ?12
             WHERE query = ?1 AND page = ?2 AND movie_id = ?3",
            params![
                FAVORITE_ANCHOR_QUERY,
                ANCHOR_PAGE,
                record.id,
                record.is_favorite,
                &record.title,
                &record.poster_path,
                &record.release_date_text,
                &record.overview,
                record.vote_average,
                &record.original_language,
                record.adult,
                &now_str,
            ],
        )?;
    } else if record.is_favorite {
        tx.execute(
            "INSERT INTO cached_movies
                (query, page, movie_id, position, title, poster_path, release_date_text,
                 overview, vote_average, original_language, adult, is_favorite, cached_at)
             VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?, 1, ?)",
            params![
                FAVORITE_ANCHOR_QUERY,
                ANCHOR_PAGE,
                record.id,
                &record.title,
                &record.poster_path,
                &record.release_date_text,
                &record.overview,
                record.vote_average,
                &record.original_language,
                record.adult,
                &now_str,
            ],
        )?;
    }

    Ok(())
}

fn is_favorite_in(conn: &Connection, id: i64) -> Result<bool, CacheError> {
    Ok(conn
        .prepare("SELECT 1 FROM cached_movies WHERE movie_id = ? AND is_favorite = 1 LIMIT 1")?
        .exists(params![id])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn create_test_cache() -> SqliteMovieCache {
        SqliteMovieCache::in_memory().unwrap()
    }

    fn record(id: i64, title: &str) -> CachedMovie {
        CachedMovie {
            id,
            title: Some(title.to_string()),
            poster_path: Some(format!("/{}.jpg", id)),
            release_date_text: Some("2002-05-01".to_string()),
            overview: Some(format!("About {}", title)),
            vote_average: Some(7.0),
            original_language: Some("en".to_string()),
            adult: Some(false),
            is_favorite: false,
        }
    }

    fn favorite(id: i64, title: &str) -> CachedMovie {
        CachedMovie {
            is_favorite: true,
            ..record(id, title)
        }
    }

    #[test]
    fn test_save_and_fetch() {
        let cache = create_test_cache();
        cache
            .save(
                &[record(2, "Batman Returns"), record(1, "Batman")],
                "batman",
                1,
            )
            .unwrap();

        let rows = cache.fetch("batman", 1).unwrap();
        assert_eq!(rows.len(), 2);
        // Ordered by title
        assert_eq!(rows[0].title.as_deref(), Some("Batman"));
        assert_eq!(rows[1].title.as_deref(), Some("Batman Returns"));
    }

    #[test]
    fn test_fetch_empty_is_not_an_error() {
        let cache = create_test_cache();
        assert!(cache.fetch("nothing", 1).unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_only_exact_key() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Alien")], "alien", 1).unwrap();
        cache.save(&[record(2, "Aliens")], "alien", 2).unwrap();
        cache.save(&[record(3, "Alien 3")], "alien", 1).unwrap();

        let page1 = cache.fetch("alien", 1).unwrap();
        assert_eq!(page1.len(), 1);
        assert_eq!(page1[0].id, 3);

        let page2 = cache.fetch("alien", 2).unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].id, 2);
    }

    #[test]
    fn test_save_rejects_anchor_key() {
        let cache = create_test_cache();
        assert!(matches!(
            cache.save(&[record(1, "x")], "x", 0),
            Err(CacheError::InvalidRecord(_))
        ));
        assert!(matches!(
            cache.save(&[record(1, "x")], FAVORITE_ANCHOR_QUERY, 1),
            Err(CacheError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_save_preserves_known_favorite() {
        let cache = create_test_cache();
        cache.set_favorite(&favorite(1, "Spiderman")).unwrap();

        // A fresh page fetch always arrives with favorite = false
        cache
            .save(&[record(1, "Spiderman"), record(2, "Spiderman 2")], "x", 1)
            .unwrap();

        let rows = cache.fetch("x", 1).unwrap();
        let spiderman = rows.iter().find(|r| r.id == 1).unwrap();
        let sequel = rows.iter().find(|r| r.id == 2).unwrap();
        assert!(spiderman.is_favorite);
        assert!(!sequel.is_favorite);
    }

    #[test]
    fn test_save_ignores_stale_incoming_favorite_flag() {
        let cache = create_test_cache();
        cache.set_favorite(&favorite(1, "Heat")).unwrap();
        cache.set_favorite(&record(1, "Heat")).unwrap();

        cache.save(&[favorite(1, "Heat")], "heat", 1).unwrap();

        assert!(!cache.is_favorite(1).unwrap());
        assert!(cache.fetch_favorites().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_of_page_keeps_favorite() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();
        cache.set_favorite(&favorite(1, "Spiderman")).unwrap();

        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();

        assert!(cache.fetch("spider", 1).unwrap()[0].is_favorite);
        assert!(cache.is_favorite(1).unwrap());
    }

    #[test]
    fn test_set_favorite_updates_all_rows() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();
        cache.save(&[record(1, "Spiderman")], "spiderman", 1).unwrap();

        cache.set_favorite(&favorite(1, "Spiderman")).unwrap();

        assert!(cache.fetch("spider", 1).unwrap()[0].is_favorite);
        assert!(cache.fetch("spiderman", 1).unwrap()[0].is_favorite);
    }

    #[test]
    fn test_unfavorite_clears_every_row() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();
        cache.set_favorite(&favorite(1, "Spiderman")).unwrap();
        assert!(cache.is_favorite(1).unwrap());

        cache.set_favorite(&record(1, "Spiderman")).unwrap();

        assert!(!cache.is_favorite(1).unwrap());
        assert!(!cache.fetch("spider", 1).unwrap()[0].is_favorite);
        assert!(cache.fetch_favorites().unwrap().is_empty());
    }

    #[test]
    fn test_unfavorite_without_anchor_creates_nothing() {
        let cache = create_test_cache();
        cache.set_favorite(&record(9, "Never liked")).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.favorites, 0);
        assert!(cache.fetch_favorites().unwrap().is_empty());
    }

    #[test]
    fn test_anchor_metadata_first_write_wins() {
        let cache = create_test_cache();
        cache.set_favorite(&favorite(1, "Original Title")).unwrap();

        let mut renamed = favorite(1, "Renamed");
        renamed.overview = Some("Different overview".to_string());
        cache.set_favorite(&renamed).unwrap();

        let favorites = cache.fetch_favorites().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].title.as_deref(), Some("Original Title"));
        assert_eq!(favorites[0].overview.as_deref(), Some("About Original Title"));
    }

    #[test]
    fn test_anchor_metadata_fills_empty_fields() {
        let cache = create_test_cache();
        let sparse = CachedMovie {
            id: 5,
            title: None,
            poster_path: None,
            release_date_text: None,
            overview: Some(String::new()),
            vote_average: None,
            original_language: None,
            adult: None,
            is_favorite: true,
        };
        cache.set_favorite(&sparse).unwrap();
        cache.set_favorite(&favorite(5, "Filled In")).unwrap();

        let favorites = cache.fetch_favorites().unwrap();
        assert_eq!(favorites[0].title.as_deref(), Some("Filled In"));
        assert_eq!(favorites[0].overview.as_deref(), Some("About Filled In"));
        assert_eq!(favorites[0].vote_average, Some(7.0));
    }

    #[test]
    fn test_anchor_survives_page_replace() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();
        cache.set_favorite(&favorite(1, "Spiderman")).unwrap();

        // The movie drops out of the refreshed page entirely
        cache.save(&[record(2, "Spider Baby")], "spider", 1).unwrap();

        let favorites = cache.fetch_favorites().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, 1);
        assert_eq!(favorites[0].title.as_deref(), Some("Spiderman"));
    }

    #[test]
    fn test_fetch_favorites_dedups_by_id() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();
        cache.save(&[record(1, "Spiderman")], "spiderman", 1).unwrap();
        cache.set_favorite(&favorite(1, "Spiderman")).unwrap();
        cache.set_favorite(&favorite(2, "Batman")).unwrap();

        let favorites = cache.fetch_favorites().unwrap();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].title.as_deref(), Some("Batman"));
        assert_eq!(favorites[1].title.as_deref(), Some("Spiderman"));
    }

    #[test]
    fn test_is_favorite_unknown_id() {
        let cache = create_test_cache();
        assert!(!cache.is_favorite(12345).unwrap());
    }

    #[test]
    fn test_clear_query_keeps_anchors() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();
        cache.save(&[record(2, "Spider Baby")], "spider", 2).unwrap();
        cache.set_favorite(&favorite(1, "Spiderman")).unwrap();

        let removed = cache.clear_query("spider").unwrap();
        assert_eq!(removed, 2);
        assert!(cache.fetch("spider", 1).unwrap().is_empty());
        assert!(cache.is_favorite(1).unwrap());
    }

    #[test]
    fn test_stats() {
        let cache = create_test_cache();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.paged_rows, 0);
        assert!(stats.oldest_entry.is_none());

        cache
            .save(&[record(1, "Alien"), record(2, "Aliens")], "alien", 1)
            .unwrap();
        cache.save(&[record(3, "Heat")], "heat", 1).unwrap();
        cache.set_favorite(&favorite(1, "Alien")).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.paged_rows, 3);
        assert_eq!(stats.cached_queries, 2);
        assert_eq!(stats.favorites, 1);
        assert!(stats.oldest_entry.is_some());
        assert!(stats.newest_entry.is_some());
    }

    #[test]
    fn test_concurrent_save_and_set_favorite() {
        let cache = Arc::new(create_test_cache());
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();
                }
            })
        };
        let favoriter = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                cache.set_favorite(&favorite(1, "Spiderman")).unwrap();
            })
        };

        writer.join().unwrap();
        favoriter.join().unwrap();

        assert!(cache.is_favorite(1).unwrap());
        assert!(cache.fetch("spider", 1).unwrap()[0].is_favorite);
    }

    #[test]
    fn test_toggle_favorite_flips_stored_flag() {
        let cache = create_test_cache();
        cache.save(&[record(1, "Heat")], "heat", 1).unwrap();

        // Incoming flag is ignored; the stored one is flipped
        assert!(cache.toggle_favorite(&favorite(1, "Heat")).unwrap());
        assert!(cache.fetch("heat", 1).unwrap()[0].is_favorite);
        assert_eq!(cache.fetch_favorites().unwrap().len(), 1);

        assert!(!cache.toggle_favorite(&favorite(1, "Heat")).unwrap());
        assert!(!cache.is_favorite(1).unwrap());
        assert!(!cache.fetch("heat", 1).unwrap()[0].is_favorite);
    }

    #[test]
    fn test_concurrent_toggles_are_not_lost() {
        let cache = Arc::new(create_test_cache());
        cache.save(&[record(1, "Spiderman")], "spider", 1).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        cache.toggle_favorite(&record(1, "Spiderman")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 200 toggles: back where it started
        assert!(!cache.is_favorite(1).unwrap());
        assert!(!cache.fetch("spider", 1).unwrap()[0].is_favorite);

        cache.toggle_favorite(&record(1, "Spiderman")).unwrap();
        assert!(cache.is_favorite(1).unwrap());
    }

    #[test]
    fn test_file_backed_cache_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.db");

        {
            let cache = SqliteMovieCache::new(&path).unwrap();
            cache.save(&[record(1, "Alien")], "alien", 1).unwrap();
            cache.set_favorite(&favorite(1, "Alien")).unwrap();
        }

        let reopened = SqliteMovieCache::new(&path).unwrap();
        assert_eq!(reopened.fetch("alien", 1).unwrap().len(), 1);
        assert!(reopened.is_favorite(1).unwrap());
    }
}
