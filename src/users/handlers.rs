use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    error::{ApiError, UserError},
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        repo_types::{DeleteOutcome, UpdateOutcome, User, UserId},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(body) = payload.map_err(|e| fail(&state, rejected(e)))?;
    let user = state.users.create(body).await.map_err(|e| fail(&state, e))?;
    info!(user_id = %user.id, "user created");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.users.list().await.map_err(|e| fail(&state, e))?;
    Ok(Json(users))
}

/// Absent ids render as `null` with 200.
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Option<User>>, ApiError> {
    let id = parse_id(&state, path)?;
    let user = state.users.get(id).await.map_err(|e| fail(&state, e))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UpdateOutcome>, ApiError> {
    let id = parse_id(&state, path)?;
    let Json(body) = payload.map_err(|e| fail(&state, rejected(e)))?;
    let outcome = state.users.update(id, body).await.map_err(|e| fail(&state, e))?;
    if outcome.matched_count == 0 {
        info!(user_id = %id, "update matched no user");
    } else {
        info!(user_id = %id, modified = outcome.modified_count, "user updated");
    }
    Ok(Json(outcome))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let id = parse_id(&state, path)?;
    let outcome = state.users.delete(id).await.map_err(|e| fail(&state, e))?;
    info!(user_id = %id, deleted = outcome.deleted_count, "user delete");
    Ok(Json(outcome))
}

/// A segment axum cannot decode is reported like any other malformed id.
fn parse_id(
    state: &AppState,
    path: Result<Path<String>, PathRejection>,
) -> Result<UserId, ApiError> {
    let Path(raw) = path
        .map_err(|e| fail(state, UserError::InvalidIdentifier(e.body_text())))?;
    raw.parse::<UserId>().map_err(|e| fail(state, e))
}

fn rejected(e: JsonRejection) -> UserError {
    UserError::Validation(e.body_text())
}

fn fail(state: &AppState, e: UserError) -> ApiError {
    match &e {
        UserError::StorageUnavailable(source) => error!(error = ?source, "storage failure"),
        other => warn!(error = %other, "request rejected"),
    }
    ApiError::new(e, state.config.error_status)
}
