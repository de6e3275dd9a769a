/// Axum handlers for the habit endpoints
///
/// Handlers only translate between HTTP and the lifecycle operations: they
/// read the caller, lock storage for the whole operation and map the result
/// to a status code.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::MutexGuard;
use tracing::info;

use crate::api::{ApiError, AppState};
use crate::domain::{HabitId, UserId};
use crate::lifecycle::{self, CreateHabitParams, UpdateHabitParams};
use crate::storage::{PageParams, PageRequest, SqliteStorage};

/// Header carrying the authenticated user id from the upstream auth layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// Read the caller's identity
fn caller(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(UserId)
        .ok_or(ApiError::Unauthenticated)
}

/// A path id that isn't a habit id can't name an existing habit
fn habit_id(raw: &str) -> Result<HabitId, ApiError> {
    HabitId::from_string(raw).map_err(|_| ApiError::NotFound(raw.to_string()))
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, SqliteStorage>, ApiError> {
    state
        .storage
        .lock()
        .map_err(|_| ApiError::Storage("storage lock poisoned".to_string()))
}

fn page_request(
    state: &AppState,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<PageRequest, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;
    Ok(PageRequest::new(params.page, params.page_size, state.page_size))
}

/// Axum handler function for POST /habits/create/
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateHabitParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = caller(&headers)?;
    let Json(params) = payload?;
    info!("POST /habits/create/ - user {}", owner);

    let storage = lock(&state)?;
    let habit = lifecycle::create_habit(&*storage, owner, params)?;
    Ok((StatusCode::CREATED, Json(habit)))
}

/// Axum handler function for GET /habits/list/
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = caller(&headers)?;
    let page = page_request(&state, query)?;
    info!("GET /habits/list/ - user {}, page {}", owner, page.page);

    let storage = lock(&state)?;
    let habits = lifecycle::list_habits(&*storage, owner, page)?;
    Ok(Json(habits))
}

/// Axum handler function for GET /habits/public/
pub async fn public_list(
    State(state): State<AppState>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let page = page_request(&state, query)?;
    info!("GET /habits/public/ - page {}", page.page);

    let storage = lock(&state)?;
    let habits = lifecycle::list_public_habits(&*storage, page)?;
    Ok(Json(habits))
}

/// Axum handler function for GET /habits/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = caller(&headers)?;
    let habit_id = habit_id(&id)?;
    info!("GET /habits/{}/ - user {}", habit_id, owner);

    let storage = lock(&state)?;
    let habit = lifecycle::retrieve_habit(&*storage, owner, &habit_id)?;
    Ok(Json(habit))
}

/// Axum handler function for PUT /habits/:id/update/
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<UpdateHabitParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = caller(&headers)?;
    let habit_id = habit_id(&id)?;
    let Json(params) = payload?;
    info!("PUT /habits/{}/update/ - user {}", habit_id, owner);

    let storage = lock(&state)?;
    let habit = lifecycle::update_habit(&*storage, owner, &habit_id, params)?;
    Ok(Json(habit))
}

/// Axum handler function for DELETE /habits/:id/delete/
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = caller(&headers)?;
    let habit_id = habit_id(&id)?;
    info!("DELETE /habits/{}/delete/ - user {}", habit_id, owner);

    let storage = lock(&state)?;
    lifecycle::delete_habit(&*storage, owner, &habit_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Axum handler function for GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
