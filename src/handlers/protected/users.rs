use axum::{extract::State, Extension};
use serde::Deserialize;
use validator::Validate;

use crate::auth::hash_password_async;
use crate::database::models::{UserChanges, UserProfile, UserWithRoles};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::state::AppState;

use super::utils::Message;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 11, message = "CPF must be at least 11 characters"))]
    pub cpf: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// GET /user - every user with their access levels (adm)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserWithRoles>> {
    let users = state.users().list_with_roles().await?;
    Ok(ApiResponse::success(users))
}

/// GET /unique-user - the caller's own profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    let profile = state
        .users()
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(profile.into()))
}

/// PUT /update-user - partial update of the caller's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> ApiResult<UserProfile> {
    let users = state.users();

    if let Some(email) = &payload.email {
        if users.find_by_email(email).await?.is_some_and(|other| other.id != user.id) {
            return Err(ApiError::bad_request("A user with this email already exists"));
        }
    }
    if let Some(cpf) = &payload.cpf {
        if users.find_by_cpf(cpf).await?.is_some_and(|other| other.id != user.id) {
            return Err(ApiError::bad_request("A user with this CPF already exists"));
        }
    }

    let password_hash = match payload.password {
        Some(password) => Some(hash_password_async(password, state.config.security.bcrypt_cost).await?),
        None => None,
    };

    let updated = users
        .update(
            user.id,
            UserChanges {
                name: payload.name,
                email: payload.email,
                cpf: payload.cpf,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(updated.into()))
}

/// DELETE /delete-user - remove the caller's account
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Message> {
    if !state.users().delete(user.id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!("User {} deleted their account", user.id);
    Ok(ApiResponse::success(Message::new("User deleted successfully")))
}
