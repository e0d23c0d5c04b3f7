use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieSearchItem},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: String,
    year: Option<i32>,
    page: Option<u32>,
    size: Option<usize>,
}

/// Handler for the provider-backed movie search endpoint
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieSearchItem>>> {
    if params.query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    let page = params.page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::InvalidInput(
            "Page must be at least 1".to_string(),
        ));
    }
    let size = params.size.unwrap_or(10);
    if size < 1 {
        return Err(AppError::InvalidInput(
            "Size must be at least 1".to_string(),
        ));
    }

    let results = state
        .catalog
        .search(&params.query, params.year, page, size)
        .await?;
    Ok(Json(results))
}

/// Handler for fetching an imported movie by id
pub async fn get(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Movie>> {
    let movie = state.catalog.get_movie(movie_id).await?;
    Ok(Json(movie))
}

/// Handler for importing a movie from the metadata provider
pub async fn import(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    if external_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "External ID cannot be empty".to_string(),
        ));
    }
    let movie = state.catalog.resolve_or_import(&external_id).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}
