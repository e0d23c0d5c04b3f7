use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    LibraryEntry, Movie, NewLibraryEntry, NewMovie, NewUser, NewWatchlist, NewWatchlistItem, User,
    Watchlist, WatchlistItem,
};

/// Persistence boundary for the movie catalog
///
/// `insert` must fail with `AppError::Conflict` when another row already holds
/// the same `external_id`, so callers can detect lost import races and re-read
/// the winning row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn find(&self, id: i64) -> AppResult<Option<Movie>>;

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Movie>>;

    async fn insert(&self, movie: NewMovie) -> AppResult<Movie>;
}

/// Persistence boundary for user accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, id: i64) -> AppResult<Option<User>>;

    async fn exists(&self, id: i64) -> AppResult<bool>;

    async fn find_all(&self) -> AppResult<Vec<User>>;

    async fn email_taken(&self, email: &str) -> AppResult<bool>;

    async fn username_taken(&self, username: &str) -> AppResult<bool>;

    /// Fails with `AppError::Conflict` on a duplicate email or username.
    async fn insert(&self, user: NewUser) -> AppResult<User>;
}

/// Persistence boundary for per-user library entries
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Fetch an entry only if it belongs to the given user.
    async fn find_for_user(&self, entry_id: i64, user_id: i64) -> AppResult<Option<LibraryEntry>>;

    async fn find_by_user_and_movie(
        &self,
        user_id: i64,
        movie_id: i64,
    ) -> AppResult<Option<LibraryEntry>>;

    /// All of a user's entries with their movies, oldest entry first.
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<(LibraryEntry, Movie)>>;

    /// Fails with `AppError::Conflict` when the user already has the movie.
    async fn insert(&self, entry: NewLibraryEntry) -> AppResult<LibraryEntry>;

    /// Persists every mutable field of the entry as given.
    async fn update(&self, entry: LibraryEntry) -> AppResult<LibraryEntry>;

    /// Returns false when no entry with that id belongs to the user.
    async fn delete_for_user(&self, entry_id: i64, user_id: i64) -> AppResult<bool>;
}

/// Persistence boundary for watchlists and their ordered items
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn find(&self, id: i64) -> AppResult<Option<Watchlist>>;

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Watchlist>>;

    async fn insert(&self, watchlist: NewWatchlist) -> AppResult<Watchlist>;

    /// Deletes the watchlist and all of its items. Returns false if absent.
    async fn delete(&self, id: i64) -> AppResult<bool>;

    /// Items sorted ascending by position, ties broken by item id.
    async fn items(&self, watchlist_id: i64) -> AppResult<Vec<WatchlistItem>>;

    /// Items with their movies, sorted ascending by position.
    async fn items_with_movies(&self, watchlist_id: i64)
        -> AppResult<Vec<(WatchlistItem, Movie)>>;

    /// Highest position currently in the list, or None when empty.
    async fn max_position(&self, watchlist_id: i64) -> AppResult<Option<i32>>;

    async fn contains_movie(&self, watchlist_id: i64, movie_id: i64) -> AppResult<bool>;

    /// Fails with `AppError::Conflict` when the movie is already in the list.
    async fn insert_item(&self, item: NewWatchlistItem) -> AppResult<WatchlistItem>;

    /// Returns false when no item with that id belongs to the watchlist.
    async fn delete_item(&self, watchlist_id: i64, item_id: i64) -> AppResult<bool>;

    async fn set_item_position(&self, item_id: i64, position: i32) -> AppResult<()>;
}
