// handlers/public/user.rs - POST /user (self-registration)

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::auth::hash_password_async;
use crate::database::models::{NewUser, UserSummary};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 11, message = "CPF must be at least 11 characters"))]
    pub cpf: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Access level is required"))]
    pub access_level_name: String,
}

/// POST /user - register a new user under an existing access level
///
/// The `adm` level is never granted here; administrators are created with
/// `banca create-admin`.
pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> ApiResult<UserSummary> {
    if Role::from_name(&payload.access_level_name) == Some(Role::Admin) {
        return Err(ApiError::field_error(
            "accessLevelName",
            "This access level cannot be self-assigned",
        ));
    }

    let users = state.users();

    if users.find_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::bad_request("A user with this email already exists"));
    }
    if users.find_by_cpf(&payload.cpf).await?.is_some() {
        return Err(ApiError::bad_request("A user with this CPF already exists"));
    }

    let access_level = state
        .access_levels()
        .find_by_name(&payload.access_level_name)
        .await?
        .ok_or_else(|| ApiError::bad_request("Access level not found"))?;

    let password_hash = hash_password_async(payload.password, state.config.security.bcrypt_cost).await?;

    let user = users
        .create(
            NewUser {
                name: payload.name,
                email: payload.email,
                cpf: payload.cpf,
                password_hash,
            },
            access_level.id,
        )
        .await?;

    tracing::info!("Registered user {} as {}", user.id, access_level.name);
    Ok(ApiResponse::created(user))
}
