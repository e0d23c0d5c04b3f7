use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    db::{LibraryStore, UserStore},
    error::{AppError, AppResult},
    models::{
        AddLibraryEntryRequest, LibraryEntry, LibraryEntryResponse, NewLibraryEntry, WatchStatus,
    },
    services::CatalogService,
};

/// Service for per-user library entries
///
/// An entry records one user's relationship to one movie: status, rating,
/// liked flag and when it was first watched.
pub struct LibraryService {
    users: Arc<dyn UserStore>,
    library: Arc<dyn LibraryStore>,
    catalog: Arc<CatalogService>,
}

/// Compute the watched timestamp a status change leaves behind
///
/// WATCHED keeps the first recorded time across repeats; PLANNED wipes it;
/// the other statuses leave it alone.
fn next_watched_at(
    current: Option<DateTime<Utc>>,
    status: WatchStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match status {
        WatchStatus::Watched => current.or(Some(now)),
        WatchStatus::Planned => None,
        WatchStatus::Watching | WatchStatus::Dropped => current,
    }
}

impl LibraryService {
    pub fn new(
        users: Arc<dyn UserStore>,
        library: Arc<dyn LibraryStore>,
        catalog: Arc<CatalogService>,
    ) -> Self {
        Self {
            users,
            library,
            catalog,
        }
    }

    /// Add a movie to the user's library, or restate the status if it is
    /// already there
    ///
    /// The movie is imported into the catalog on first contact.
    pub async fn add_or_update(
        &self,
        user_id: i64,
        request: AddLibraryEntryRequest,
    ) -> AppResult<LibraryEntryResponse> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let movie = self.catalog.resolve_or_import(&request.external_id).await?;
        let now = Utc::now();

        let entry = match self
            .library
            .find_by_user_and_movie(user_id, movie.id)
            .await?
        {
            Some(mut entry) => {
                entry.status = request.status;
                entry.watched_at = next_watched_at(entry.watched_at, request.status, now);
                entry.updated_at = now;
                self.library.update(entry).await?
            }
            None => {
                self.library
                    .insert(NewLibraryEntry {
                        user_id,
                        movie_id: movie.id,
                        status: request.status,
                        rating: None,
                        liked: false,
                        watched_at: next_watched_at(None, request.status, now),
                        created_at: now,
                        updated_at: now,
                    })
                    .await?
            }
        };

        tracing::info!(
            user_id,
            movie_id = movie.id,
            status = ?entry.status,
            "Library entry saved"
        );

        Ok(LibraryEntryResponse::new(entry, movie))
    }

    pub async fn list(&self, user_id: i64) -> AppResult<Vec<LibraryEntryResponse>> {
        let entries = self.library.list_for_user(user_id).await?;
        Ok(entries
            .into_iter()
            .map(|(entry, movie)| LibraryEntryResponse::new(entry, movie))
            .collect())
    }

    pub async fn update_status(
        &self,
        user_id: i64,
        entry_id: i64,
        status: WatchStatus,
    ) -> AppResult<LibraryEntryResponse> {
        let mut entry = self.require_entry(entry_id, user_id).await?;
        let now = Utc::now();

        entry.status = status;
        entry.watched_at = next_watched_at(entry.watched_at, status, now);
        entry.updated_at = now;

        let entry = self.library.update(entry).await?;
        self.with_movie(entry).await
    }

    pub async fn update_rating(
        &self,
        user_id: i64,
        entry_id: i64,
        rating: i32,
    ) -> AppResult<LibraryEntryResponse> {
        let mut entry = self.require_entry(entry_id, user_id).await?;

        entry.rating = Some(rating);
        entry.updated_at = Utc::now();

        let entry = self.library.update(entry).await?;
        self.with_movie(entry).await
    }

    pub async fn update_liked(
        &self,
        user_id: i64,
        entry_id: i64,
        liked: bool,
    ) -> AppResult<LibraryEntryResponse> {
        let mut entry = self.require_entry(entry_id, user_id).await?;

        entry.liked = liked;
        entry.updated_at = Utc::now();

        let entry = self.library.update(entry).await?;
        self.with_movie(entry).await
    }

    pub async fn delete(&self, user_id: i64, entry_id: i64) -> AppResult<()> {
        if !self.library.delete_for_user(entry_id, user_id).await? {
            return Err(AppError::NotFound("Library entry not found".to_string()));
        }
        tracing::info!(user_id, entry_id, "Library entry deleted");
        Ok(())
    }

    /// Ownership check: an entry id belonging to another user reads as absent
    async fn require_entry(&self, entry_id: i64, user_id: i64) -> AppResult<LibraryEntry> {
        self.library
            .find_for_user(entry_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Library entry not found".to_string()))
    }

    async fn with_movie(&self, entry: LibraryEntry) -> AppResult<LibraryEntryResponse> {
        let movie = self.catalog.get_movie(entry.movie_id).await?;
        Ok(LibraryEntryResponse::new(entry, movie))
    }
}
