use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::database::models::{AccessLevel, AccessLevelWithUsers};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccessLevelRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,
}

/// POST /access-level (adm)
pub async fn create_access_level(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateAccessLevelRequest>,
) -> ApiResult<AccessLevel> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::field_error("name", "Name must be between 1 and 50 characters"));
    }

    let levels = state.access_levels();
    if levels.find_by_name(name).await?.is_some() {
        return Err(ApiError::bad_request("Access level already exists"));
    }

    let level = levels.create(name).await?;
    tracing::info!("Created access level {}", level.name);
    Ok(ApiResponse::created(level))
}

/// GET /access-level (adm)
pub async fn list_access_levels(State(state): State<AppState>) -> ApiResult<Vec<AccessLevelWithUsers>> {
    let levels = state.access_levels().list_with_users().await?;
    Ok(ApiResponse::success(levels))
}
