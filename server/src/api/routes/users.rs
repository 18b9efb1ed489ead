//! User API endpoints
//!
//! Users can only read and modify themselves; a mismatched path id is
//! Forbidden even when the target user exists.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::auth::CurrentUser;
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::core::constants::{MSG_USER_MODIFICATION_FORBIDDEN, MSG_USER_NOT_FOUND};
use crate::data::TransactionalService;
use crate::data::types::{UserRow, UserUpdate};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    /// Derived at read time from the owned-company count; never stored
    pub is_onboarded: bool,
    pub company_ids: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserDto {
    fn new(user: UserRow, company_ids: Vec<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture: user.profile_picture,
            is_onboarded: !company_ids.is_empty(),
            company_ids,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdateUserRequest {
    /// Update requests must carry at least one field
    fn ensure_has_updates(&self) -> Result<(), ApiError> {
        if self.first_name.is_none() && self.last_name.is_none() && self.profile_picture.is_none()
        {
            return Err(ApiError::bad_request(
                "EMPTY_UPDATE",
                "No properties provided for update.",
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct UserIdParams {
    user_id: String,
}

/// Build user routes (behind the auth middleware)
pub fn routes(database: Arc<TransactionalService>) -> Router {
    Router::new()
        .route("/users/self", get(get_self))
        .route(
            "/users/{user_id}",
            axum::routing::patch(update_user).delete(delete_user),
        )
        .with_state(database)
}

/// Profile of the authenticated user
pub async fn get_self(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
) -> Result<Json<UserDto>, ApiError> {
    let company_ids = database
        .repository()
        .owned_company_ids(&current.user.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(UserDto::new(current.user, company_ids)))
}

fn ensure_self(current: &CurrentUser, user_id: &str) -> Result<(), ApiError> {
    if current.user.id != user_id {
        return Err(ApiError::forbidden(
            "USER_MODIFICATION_FORBIDDEN",
            MSG_USER_MODIFICATION_FORBIDDEN,
        ));
    }
    Ok(())
}

/// Update the authenticated user's profile
pub async fn update_user(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
    Path(params): Path<UserIdParams>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    ensure_self(&current, &params.user_id)?;
    request.ensure_has_updates()?;

    let update = UserUpdate {
        first_name: request.first_name,
        last_name: request.last_name,
        profile_picture: request.profile_picture,
    };

    let repo = database.repository();
    let user = repo
        .update_user(&params.user_id, &update)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", MSG_USER_NOT_FOUND))?;

    let company_ids = repo
        .owned_company_ids(&user.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(UserDto::new(user, company_ids)))
}

/// Delete the authenticated user
pub async fn delete_user(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
    Path(params): Path<UserIdParams>,
) -> Result<StatusCode, ApiError> {
    ensure_self(&current, &params.user_id)?;

    let deleted = database
        .repository()
        .delete_user(&params.user_id)
        .await
        .map_err(ApiError::from_data)?;
    if !deleted {
        return Err(ApiError::not_found("USER_NOT_FOUND", MSG_USER_NOT_FOUND));
    }

    Ok(StatusCode::NO_CONTENT)
}
