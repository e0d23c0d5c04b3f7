use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A movie in the local catalog
///
/// Rows are created exclusively by importing from the metadata provider and are
/// deduplicated on `external_id`. Once imported, a movie is never re-fetched.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    /// The provider's identifier for this movie, stored as text
    pub external_id: String,
    pub title: String,
    pub release_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the movie catalog
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub external_id: String,
    pub title: String,
    pub release_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single provider search result, mapped but not persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSearchItem {
    pub external_id: String,
    pub title: String,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
    pub overview: String,
}
