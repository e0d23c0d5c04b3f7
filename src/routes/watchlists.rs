use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        AddWatchlistItemRequest, CreateWatchlistRequest, ReorderItemsRequest,
        WatchlistItemResponse, WatchlistResponse,
    },
    state::AppState,
};

/// Handler for creating a watchlist
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<CreateWatchlistRequest>,
) -> AppResult<(StatusCode, Json<WatchlistResponse>)> {
    if request.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Watchlist title cannot be empty".to_string(),
        ));
    }
    let watchlist = state.watchlists.create(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(watchlist)))
}

/// Handler for listing a user's watchlists with their items
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<WatchlistResponse>>> {
    let watchlists = state.watchlists.list_for_user(user_id).await?;
    Ok(Json(watchlists))
}

/// Handler for fetching a single watchlist with its items
pub async fn get(
    State(state): State<AppState>,
    Path(watchlist_id): Path<i64>,
) -> AppResult<Json<WatchlistResponse>> {
    let watchlist = state.watchlists.get(watchlist_id).await?;
    Ok(Json(watchlist))
}

/// Handler for deleting a watchlist and its items
pub async fn remove(
    State(state): State<AppState>,
    Path(watchlist_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.watchlists.delete(watchlist_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for appending a movie to a watchlist
pub async fn add_item(
    State(state): State<AppState>,
    Path(watchlist_id): Path<i64>,
    Json(request): Json<AddWatchlistItemRequest>,
) -> AppResult<(StatusCode, Json<WatchlistItemResponse>)> {
    if request.external_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "External ID cannot be empty".to_string(),
        ));
    }
    let item = state.watchlists.add_item(watchlist_id, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for removing a single item from a watchlist
pub async fn remove_item(
    State(state): State<AppState>,
    Path((watchlist_id, item_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.watchlists.remove_item(watchlist_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for rewriting the order of a watchlist's items
pub async fn reorder(
    State(state): State<AppState>,
    Path(watchlist_id): Path<i64>,
    Json(request): Json<ReorderItemsRequest>,
) -> AppResult<StatusCode> {
    if request.ordered_item_ids.is_empty() {
        return Err(AppError::InvalidInput(
            "Item order cannot be empty".to_string(),
        ));
    }
    state
        .watchlists
        .reorder(watchlist_id, &request.ordered_item_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
