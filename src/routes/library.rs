use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        AddLibraryEntryRequest, LibraryEntryResponse, UpdateLikedRequest, UpdateRatingRequest,
        UpdateStatusRequest,
    },
    state::AppState,
};

/// Handler for adding a movie to a user's library
///
/// Importing the movie from the metadata provider happens implicitly when it
/// is not in the catalog yet.
pub async fn add(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<AddLibraryEntryRequest>,
) -> AppResult<(StatusCode, Json<LibraryEntryResponse>)> {
    if request.external_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "External ID cannot be empty".to_string(),
        ));
    }
    let entry = state.library.add_or_update(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for listing a user's library
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<LibraryEntryResponse>>> {
    let entries = state.library.list(user_id).await?;
    Ok(Json(entries))
}

/// Handler for changing an entry's watch status
pub async fn update_status(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<LibraryEntryResponse>> {
    let entry = state
        .library
        .update_status(user_id, entry_id, request.status)
        .await?;
    Ok(Json(entry))
}

/// Handler for rating an entry
pub async fn update_rating(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateRatingRequest>,
) -> AppResult<Json<LibraryEntryResponse>> {
    if !(0..=10).contains(&request.rating) {
        return Err(AppError::InvalidInput(
            "Rating must be between 0 and 10".to_string(),
        ));
    }
    let entry = state
        .library
        .update_rating(user_id, entry_id, request.rating)
        .await?;
    Ok(Json(entry))
}

/// Handler for toggling the liked flag on an entry
pub async fn update_liked(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateLikedRequest>,
) -> AppResult<Json<LibraryEntryResponse>> {
    let entry = state
        .library
        .update_liked(user_id, entry_id, request.liked)
        .await?;
    Ok(Json(entry))
}

/// Handler for removing an entry from a user's library
pub async fn remove(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.library.delete(user_id, entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
