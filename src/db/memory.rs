use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::store::{LibraryStore, MovieStore, UserStore, WatchlistStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    LibraryEntry, Movie, NewLibraryEntry, NewMovie, NewUser, NewWatchlist, NewWatchlistItem, User,
    Watchlist, WatchlistItem,
};

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    movies: HashMap<i64, Movie>,
    library_entries: HashMap<i64, LibraryEntry>,
    watchlists: HashMap<i64, Watchlist>,
    watchlist_items: HashMap<i64, WatchlistItem>,
}

/// In-memory implementation of the store traits
///
/// Enforces the same uniqueness and cascade rules as the Postgres schema.
/// The test suite runs entirely against this store.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn find(&self, id: i64) -> AppResult<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.get(&id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables
            .movies
            .values()
            .find(|movie| movie.external_id == external_id)
            .cloned())
    }

    async fn insert(&self, movie: NewMovie) -> AppResult<Movie> {
        let mut tables = self.tables.write().await;
        if tables
            .movies
            .values()
            .any(|existing| existing.external_id == movie.external_id)
        {
            return Err(AppError::Conflict("Movie already imported".to_string()));
        }

        let id = self.next_id();
        let movie = Movie {
            id,
            external_id: movie.external_id,
            title: movie.title,
            release_year: movie.release_year,
            runtime_minutes: movie.runtime_minutes,
            poster_url: movie.poster_url,
            overview: movie.overview,
            created_at: movie.created_at,
        };
        tables.movies.insert(id, movie.clone());
        Ok(movie)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find(&self, id: i64) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.contains_key(&id))
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|user| user.email == email))
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|user| user.username == username))
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|existing| existing.email == user.email)
        {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        if tables
            .users
            .values()
            .any(|existing| existing.username == user.username)
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let id = self.next_id();
        let user = User {
            id,
            email: user.email,
            username: user.username,
            password: user.password,
            created_at: user.created_at,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn find_for_user(&self, entry_id: i64, user_id: i64) -> AppResult<Option<LibraryEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .library_entries
            .get(&entry_id)
            .filter(|entry| entry.user_id == user_id)
            .cloned())
    }

    async fn find_by_user_and_movie(
        &self,
        user_id: i64,
        movie_id: i64,
    ) -> AppResult<Option<LibraryEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .library_entries
            .values()
            .find(|entry| entry.user_id == user_id && entry.movie_id == movie_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<(LibraryEntry, Movie)>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<LibraryEntry> = tables
            .library_entries
            .values()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.id);

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                tables
                    .movies
                    .get(&entry.movie_id)
                    .cloned()
                    .map(|movie| (entry, movie))
            })
            .collect())
    }

    async fn insert(&self, entry: NewLibraryEntry) -> AppResult<LibraryEntry> {
        let mut tables = self.tables.write().await;
        if tables
            .library_entries
            .values()
            .any(|existing| existing.user_id == entry.user_id && existing.movie_id == entry.movie_id)
        {
            return Err(AppError::Conflict("Movie already in library".to_string()));
        }

        let id = self.next_id();
        let entry = LibraryEntry {
            id,
            user_id: entry.user_id,
            movie_id: entry.movie_id,
            status: entry.status,
            rating: entry.rating,
            liked: entry.liked,
            watched_at: entry.watched_at,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        };
        tables.library_entries.insert(id, entry.clone());
        Ok(entry)
    }

    async fn update(&self, entry: LibraryEntry) -> AppResult<LibraryEntry> {
        let mut tables = self.tables.write().await;
        match tables.library_entries.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(entry)
            }
            None => Err(AppError::Internal(format!(
                "No library entry with id {}",
                entry.id
            ))),
        }
    }

    async fn delete_for_user(&self, entry_id: i64, user_id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .library_entries
            .get(&entry_id)
            .is_some_and(|entry| entry.user_id == user_id);
        if owned {
            tables.library_entries.remove(&entry_id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    async fn find(&self, id: i64) -> AppResult<Option<Watchlist>> {
        let tables = self.tables.read().await;
        Ok(tables.watchlists.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Watchlist>> {
        let tables = self.tables.read().await;
        let mut watchlists: Vec<Watchlist> = tables
            .watchlists
            .values()
            .filter(|watchlist| watchlist.user_id == user_id)
            .cloned()
            .collect();
        watchlists.sort_by_key(|watchlist| watchlist.id);
        Ok(watchlists)
    }

    async fn insert(&self, watchlist: NewWatchlist) -> AppResult<Watchlist> {
        let mut tables = self.tables.write().await;
        let id = self.next_id();
        let watchlist = Watchlist {
            id,
            user_id: watchlist.user_id,
            title: watchlist.title,
            description: watchlist.description,
            created_at: watchlist.created_at,
        };
        tables.watchlists.insert(id, watchlist.clone());
        Ok(watchlist)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.watchlists.remove(&id).is_none() {
            return Ok(false);
        }
        // Cascade, mirroring the FK behavior
        tables
            .watchlist_items
            .retain(|_, item| item.watchlist_id != id);
        Ok(true)
    }

    async fn items(&self, watchlist_id: i64) -> AppResult<Vec<WatchlistItem>> {
        let tables = self.tables.read().await;
        let mut items: Vec<WatchlistItem> = tables
            .watchlist_items
            .values()
            .filter(|item| item.watchlist_id == watchlist_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.position, item.id));
        Ok(items)
    }

    async fn items_with_movies(
        &self,
        watchlist_id: i64,
    ) -> AppResult<Vec<(WatchlistItem, Movie)>> {
        let items = WatchlistStore::items(self, watchlist_id).await?;
        let tables = self.tables.read().await;
        Ok(items
            .into_iter()
            .filter_map(|item| {
                tables
                    .movies
                    .get(&item.movie_id)
                    .cloned()
                    .map(|movie| (item, movie))
            })
            .collect())
    }

    async fn max_position(&self, watchlist_id: i64) -> AppResult<Option<i32>> {
        let tables = self.tables.read().await;
        Ok(tables
            .watchlist_items
            .values()
            .filter(|item| item.watchlist_id == watchlist_id)
            .map(|item| item.position)
            .max())
    }

    async fn contains_movie(&self, watchlist_id: i64, movie_id: i64) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .watchlist_items
            .values()
            .any(|item| item.watchlist_id == watchlist_id && item.movie_id == movie_id))
    }

    async fn insert_item(&self, item: NewWatchlistItem) -> AppResult<WatchlistItem> {
        let mut tables = self.tables.write().await;
        if tables
            .watchlist_items
            .values()
            .any(|existing| {
                existing.watchlist_id == item.watchlist_id && existing.movie_id == item.movie_id
            })
        {
            return Err(AppError::Conflict(
                "Movie already exists in this watchlist".to_string(),
            ));
        }

        let id = self.next_id();
        let item = WatchlistItem {
            id,
            watchlist_id: item.watchlist_id,
            movie_id: item.movie_id,
            position: item.position,
            added_at: item.added_at,
        };
        tables.watchlist_items.insert(id, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, watchlist_id: i64, item_id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .watchlist_items
            .get(&item_id)
            .is_some_and(|item| item.watchlist_id == watchlist_id);
        if owned {
            tables.watchlist_items.remove(&item_id);
        }
        Ok(owned)
    }

    async fn set_item_position(&self, item_id: i64, position: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(item) = tables.watchlist_items.get_mut(&item_id) {
            item.position = position;
        }
        Ok(())
    }
}
