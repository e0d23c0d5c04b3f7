use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::db::store::{LibraryStore, MovieStore, UserStore, WatchlistStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    LibraryEntry, Movie, NewLibraryEntry, NewMovie, NewUser, NewWatchlist, NewWatchlistItem, User,
    Watchlist, WatchlistItem,
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const MOVIE_COLUMNS: &str =
    "id, external_id, title, release_year, runtime_minutes, poster_url, overview, created_at";
const USER_COLUMNS: &str = "id, email, username, password, created_at";
const LIBRARY_COLUMNS: &str =
    "id, user_id, movie_id, status, rating, liked, watched_at, created_at, updated_at";
const WATCHLIST_COLUMNS: &str = "id, user_id, title, description, created_at";
const ITEM_COLUMNS: &str = "id, watchlist_id, movie_id, position, added_at";

/// Postgres `unique_violation` error code
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed implementation of all store traits
///
/// Uses the runtime query API throughout so the crate builds without a live
/// database. Unique-constraint violations are translated to
/// `AppError::Conflict`; everything else surfaces as a database error.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn movies_by_ids(&self, ids: &[i64]) -> AppResult<HashMap<i64, Movie>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ANY($1)");
        let movies = sqlx::query_as::<_, Movie>(&query)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(movies.into_iter().map(|movie| (movie.id, movie)).collect())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

fn on_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(message.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn find(&self, id: i64) -> AppResult<Option<Movie>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Movie>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE external_id = $1");
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    async fn insert(&self, movie: NewMovie) -> AppResult<Movie> {
        let query = format!(
            "INSERT INTO movies (external_id, title, release_year, runtime_minutes, poster_url, overview, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {MOVIE_COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(movie.external_id)
            .bind(movie.title)
            .bind(movie.release_year)
            .bind(movie.runtime_minutes)
            .bind(movie.poster_url)
            .bind(movie.overview)
            .bind(movie.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| on_unique_violation(e, "Movie already imported"))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find(&self, id: i64) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        let taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(taken)
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        let taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(taken)
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let query = format!(
            "INSERT INTO users (email, username, password, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.email)
            .bind(user.username)
            .bind(user.password)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                // The pre-insert checks race with concurrent signups; pick the
                // message from the constraint that actually fired.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                        let message = match db_err.constraint() {
                            Some("uq_users_username") => "Username already exists",
                            _ => "Email already exists",
                        };
                        return AppError::Conflict(message.to_string());
                    }
                }
                e.into()
            })
    }
}

#[async_trait]
impl LibraryStore for PgStore {
    async fn find_for_user(&self, entry_id: i64, user_id: i64) -> AppResult<Option<LibraryEntry>> {
        let query =
            format!("SELECT {LIBRARY_COLUMNS} FROM library_entries WHERE id = $1 AND user_id = $2");
        let entry = sqlx::query_as::<_, LibraryEntry>(&query)
            .bind(entry_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn find_by_user_and_movie(
        &self,
        user_id: i64,
        movie_id: i64,
    ) -> AppResult<Option<LibraryEntry>> {
        let query = format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_entries WHERE user_id = $1 AND movie_id = $2"
        );
        let entry = sqlx::query_as::<_, LibraryEntry>(&query)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<(LibraryEntry, Movie)>> {
        let query =
            format!("SELECT {LIBRARY_COLUMNS} FROM library_entries WHERE user_id = $1 ORDER BY id");
        let entries = sqlx::query_as::<_, LibraryEntry>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let movie_ids: Vec<i64> = entries.iter().map(|entry| entry.movie_id).collect();
        let movies = self.movies_by_ids(&movie_ids).await?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                movies
                    .get(&entry.movie_id)
                    .cloned()
                    .map(|movie| (entry, movie))
            })
            .collect())
    }

    async fn insert(&self, entry: NewLibraryEntry) -> AppResult<LibraryEntry> {
        let query = format!(
            "INSERT INTO library_entries (user_id, movie_id, status, rating, liked, watched_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {LIBRARY_COLUMNS}"
        );
        sqlx::query_as::<_, LibraryEntry>(&query)
            .bind(entry.user_id)
            .bind(entry.movie_id)
            .bind(entry.status)
            .bind(entry.rating)
            .bind(entry.liked)
            .bind(entry.watched_at)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| on_unique_violation(e, "Movie already in library"))
    }

    async fn update(&self, entry: LibraryEntry) -> AppResult<LibraryEntry> {
        let query = format!(
            "UPDATE library_entries \
             SET status = $1, rating = $2, liked = $3, watched_at = $4, updated_at = $5 \
             WHERE id = $6 \
             RETURNING {LIBRARY_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, LibraryEntry>(&query)
            .bind(entry.status)
            .bind(entry.rating)
            .bind(entry.liked)
            .bind(entry.watched_at)
            .bind(entry.updated_at)
            .bind(entry.id)
            .fetch_one(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn delete_for_user(&self, entry_id: i64, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM library_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl WatchlistStore for PgStore {
    async fn find(&self, id: i64) -> AppResult<Option<Watchlist>> {
        let query = format!("SELECT {WATCHLIST_COLUMNS} FROM watchlists WHERE id = $1");
        let watchlist = sqlx::query_as::<_, Watchlist>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(watchlist)
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Watchlist>> {
        let query =
            format!("SELECT {WATCHLIST_COLUMNS} FROM watchlists WHERE user_id = $1 ORDER BY id");
        let watchlists = sqlx::query_as::<_, Watchlist>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(watchlists)
    }

    async fn insert(&self, watchlist: NewWatchlist) -> AppResult<Watchlist> {
        let query = format!(
            "INSERT INTO watchlists (user_id, title, description, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {WATCHLIST_COLUMNS}"
        );
        let watchlist = sqlx::query_as::<_, Watchlist>(&query)
            .bind(watchlist.user_id)
            .bind(watchlist.title)
            .bind(watchlist.description)
            .bind(watchlist.created_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(watchlist)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        // Items go with the list via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM watchlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn items(&self, watchlist_id: i64) -> AppResult<Vec<WatchlistItem>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM watchlist_items WHERE watchlist_id = $1 \
             ORDER BY position, id"
        );
        let items = sqlx::query_as::<_, WatchlistItem>(&query)
            .bind(watchlist_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn items_with_movies(
        &self,
        watchlist_id: i64,
    ) -> AppResult<Vec<(WatchlistItem, Movie)>> {
        let items = WatchlistStore::items(self, watchlist_id).await?;
        let movie_ids: Vec<i64> = items.iter().map(|item| item.movie_id).collect();
        let movies = self.movies_by_ids(&movie_ids).await?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                movies
                    .get(&item.movie_id)
                    .cloned()
                    .map(|movie| (item, movie))
            })
            .collect())
    }

    async fn max_position(&self, watchlist_id: i64) -> AppResult<Option<i32>> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(position) FROM watchlist_items WHERE watchlist_id = $1",
        )
        .bind(watchlist_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    async fn contains_movie(&self, watchlist_id: i64, movie_id: i64) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM watchlist_items WHERE watchlist_id = $1 AND movie_id = $2)",
        )
        .bind(watchlist_id)
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_item(&self, item: NewWatchlistItem) -> AppResult<WatchlistItem> {
        let query = format!(
            "INSERT INTO watchlist_items (watchlist_id, movie_id, position, added_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, WatchlistItem>(&query)
            .bind(item.watchlist_id)
            .bind(item.movie_id)
            .bind(item.position)
            .bind(item.added_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| on_unique_violation(e, "Movie already exists in this watchlist"))
    }

    async fn delete_item(&self, watchlist_id: i64, item_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watchlist_items WHERE id = $1 AND watchlist_id = $2")
            .bind(item_id)
            .bind(watchlist_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_item_position(&self, item_id: i64, position: i32) -> AppResult<()> {
        sqlx::query("UPDATE watchlist_items SET position = $1 WHERE id = $2")
            .bind(position)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
