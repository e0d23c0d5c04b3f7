use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{CreateUserRequest, User},
    state::AppState,
};

/// Handler for creating a user
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    request.validate()?;
    let user = state.users.create(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for listing all users
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

/// Handler for fetching a single user
pub async fn get(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.users.get(user_id).await?;
    Ok(Json(user))
}
