use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Movie;

/// Where a movie sits in a user's library
///
/// Stored and serialized in UPPERCASE, matching the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum WatchStatus {
    Planned,
    Watching,
    Watched,
    Dropped,
}

/// One user's relationship to one movie, unique per (user, movie)
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub status: WatchStatus,
    /// 0 through 10 when set
    pub rating: Option<i32>,
    pub liked: bool,
    /// Set the first time the entry transitions to WATCHED, cleared by PLANNED
    pub watched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a library entry
#[derive(Debug, Clone)]
pub struct NewLibraryEntry {
    pub user_id: i64,
    pub movie_id: i64,
    pub status: WatchStatus,
    pub rating: Option<i32>,
    pub liked: bool,
    pub watched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLibraryEntryRequest {
    pub external_id: String,
    pub status: WatchStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: WatchStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub rating: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLikedRequest {
    pub liked: bool,
}

/// A library entry with its movie embedded, as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntryResponse {
    pub id: i64,
    pub movie: Movie,
    pub status: WatchStatus,
    pub rating: Option<i32>,
    pub liked: bool,
    pub watched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LibraryEntryResponse {
    pub fn new(entry: LibraryEntry, movie: Movie) -> Self {
        Self {
            id: entry.id,
            movie,
            status: entry.status,
            rating: entry.rating,
            liked: entry.liked,
            watched_at: entry.watched_at,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_status_serde_uppercase() {
        assert_eq!(
            serde_json::to_string(&WatchStatus::Planned).unwrap(),
            r#""PLANNED""#
        );
        assert_eq!(
            serde_json::from_str::<WatchStatus>(r#""WATCHED""#).unwrap(),
            WatchStatus::Watched
        );
    }

    #[test]
    fn test_watch_status_rejects_unknown_value() {
        assert!(serde_json::from_str::<WatchStatus>(r#""BINGED""#).is_err());
    }

    #[test]
    fn test_add_request_deserializes_camel_case() {
        let request: AddLibraryEntryRequest =
            serde_json::from_str(r#"{"externalId": "603", "status": "PLANNED"}"#).unwrap();
        assert_eq!(request.external_id, "603");
        assert_eq!(request.status, WatchStatus::Planned);
    }
}
