// handlers/public/auth.rs - POST /sign-in

use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::verify_password_async;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// POST /sign-in - exchange email + password for a one-hour bearer token
///
/// 404 when no user has the email, 401 when the password does not match.
pub async fn sign_in(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignInRequest>,
) -> ApiResult<SignInResponse> {
    let users = state.users();

    let user = users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password_async(payload.password, user.password.clone()).await? {
        tracing::warn!("Failed sign-in for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let roles = users.roles_of(user.id).await?;
    let token = state.tokens.issue(user.id, roles)?;

    tracing::info!("User {} signed in", user.id);

    Ok(ApiResponse::success(SignInResponse {
        token,
        token_type: "Bearer",
        expires_in: state.tokens.lifetime_secs(),
    }))
}
