//! HTTP handlers for the users API

use axum::extract::rejection::JsonRejection;
use rideshare_service::prelude::*;

use crate::models::{
    CreateUserRequest, UpdateUserRequest, User, UserPatch, NAME_AND_EMAIL_REQUIRED,
    USER_DELETED, USER_NOT_FOUND,
};
use crate::AppState;

/// Parse a path id; anything that is not an integer matches no user
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn not_found() -> Error {
    Error::NotFound(USER_NOT_FOUND.to_string())
}

/// List all users
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = state.store.list().await;
    debug!("Returning {} users", users.len());
    Json(users)
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<User>> {
    let Some(id) = parse_id(&raw_id) else {
        warn!("User not found: {}", raw_id);
        return Err(not_found());
    };

    match state.store.get(id).await {
        Some(user) => Ok(Json(user)),
        None => {
            warn!("User not found: {}", id);
            Err(not_found())
        }
    }
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>)> {
    let new_user = match payload {
        Ok(Json(request)) => request.validate()?,
        Err(rejection) => {
            debug!("Unreadable create body: {}", rejection.body_text());
            return Err(Error::BadRequest(NAME_AND_EMAIL_REQUIRED.to_string()));
        }
    };

    let user = state.store.create(new_user).await;

    info!(user_id = user.id, "Created user {} <{}>", user.name, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user
///
/// The id is resolved before the body is looked at, so an unknown id is 404
/// whatever the body. A request without a JSON content type changes nothing.
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let id = parse_id(&raw_id).ok_or_else(not_found)?;
    if state.store.get(id).await.is_none() {
        warn!("User not found for update: {}", id);
        return Err(not_found());
    }

    let patch = match payload {
        Ok(Json(request)) => request.into_patch(),
        Err(JsonRejection::MissingJsonContentType(_)) => UserPatch::default(),
        Err(rejection) => return Err(Error::BadRequest(rejection.body_text())),
    };

    let user = state.store.update(id, patch).await.ok_or_else(|| {
        warn!("User not found for update: {}", id);
        not_found()
    })?;

    info!(user_id = user.id, "Updated user");
    Ok(Json(user))
}

/// Delete a user
///
/// Succeeds whether or not a user with the id exists.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Json<MessageResponse> {
    if let Some(id) = parse_id(&raw_id) {
        let removed = state.store.delete(id).await;
        info!(user_id = id, removed, "Deleted user");
    }

    Json(MessageResponse::new(USER_DELETED))
}
