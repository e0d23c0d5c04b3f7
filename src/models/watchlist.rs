use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Movie;

/// A named, ordered list of movies belonging to one user
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One movie's slot in a watchlist, unique per (watchlist, movie)
///
/// Positions start at 1 and only grow; removing an item leaves a gap rather
/// than renumbering the rest.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: i64,
    pub watchlist_id: i64,
    pub movie_id: i64,
    pub position: i32,
    pub added_at: DateTime<Utc>,
}

/// Insert payload for a watchlist
#[derive(Debug, Clone)]
pub struct NewWatchlist {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a watchlist item
#[derive(Debug, Clone)]
pub struct NewWatchlistItem {
    pub watchlist_id: i64,
    pub movie_id: i64,
    pub position: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWatchlistRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchlistItemRequest {
    pub external_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItemsRequest {
    pub ordered_item_ids: Vec<i64>,
}

/// A watchlist item with its movie embedded, as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItemResponse {
    pub id: i64,
    pub movie: Movie,
    pub position: i32,
    pub added_at: DateTime<Utc>,
}

impl WatchlistItemResponse {
    pub fn new(item: WatchlistItem, movie: Movie) -> Self {
        Self {
            id: item.id,
            movie,
            position: item.position,
            added_at: item.added_at,
        }
    }
}

/// A watchlist with its items embedded in position order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<WatchlistItemResponse>,
}

impl WatchlistResponse {
    pub fn new(watchlist: Watchlist, items: Vec<(WatchlistItem, Movie)>) -> Self {
        Self {
            id: watchlist.id,
            title: watchlist.title,
            description: watchlist.description,
            created_at: watchlist.created_at,
            items: items
                .into_iter()
                .map(|(item, movie)| WatchlistItemResponse::new(item, movie))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_request_deserializes_camel_case() {
        let request: ReorderItemsRequest =
            serde_json::from_str(r#"{"orderedItemIds": [3, 1, 2]}"#).unwrap();
        assert_eq!(request.ordered_item_ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_create_request_description_defaults_to_none() {
        let request: CreateWatchlistRequest =
            serde_json::from_str(r#"{"title": "Halloween"}"#).unwrap();
        assert_eq!(request.title, "Halloween");
        assert!(request.description.is_none());
    }
}
