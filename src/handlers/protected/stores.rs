use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use validator::Validate;

use crate::database::models::{Store, StoreChanges, StoreListing, StoreWithProducts};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::state::AppState;

use super::utils::{ensure_owner, parse_id, Message};

const NOT_OWNER: &str = "This store does not belong to you";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoreRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStoreRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// POST /store
pub async fn create_store(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<CreateStoreRequest>,
) -> ApiResult<Store> {
    let store = state
        .stores()
        .create(user.id, &payload.name, &payload.description)
        .await?;

    tracing::info!("User {} opened store {}", user.id, store.id);
    Ok(ApiResponse::created(store))
}

/// GET /stores
pub async fn list_stores(State(state): State<AppState>) -> ApiResult<Vec<StoreListing>> {
    Ok(ApiResponse::success(state.stores().list_all().await?))
}

/// GET /get-all-store-by-owner
pub async fn list_own_stores(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Store>> {
    Ok(ApiResponse::success(state.stores().list_by_owner(user.id).await?))
}

/// GET /get-unique-store-by-owner/:storeId
pub async fn get_own_store(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(store_id): Path<String>,
) -> ApiResult<StoreWithProducts> {
    let store_id = parse_id(&store_id, "storeId")?;
    let stores = state.stores();

    let store = stores.get(store_id).await?;
    ensure_owner(store.user_id, &user, NOT_OWNER)?;

    Ok(ApiResponse::success(stores.with_products(store).await?))
}

/// PUT /update-store/:storeId
pub async fn update_store(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(store_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateStoreRequest>,
) -> ApiResult<Store> {
    let store_id = parse_id(&store_id, "storeId")?;
    let stores = state.stores();

    let store = stores.get(store_id).await?;
    ensure_owner(store.user_id, &user, NOT_OWNER)?;

    let updated = stores
        .update(
            store_id,
            StoreChanges {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE|GET /delete-store/:storeId - removes the store and its products
pub async fn delete_store(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(store_id): Path<String>,
) -> ApiResult<Message> {
    let store_id = parse_id(&store_id, "storeId")?;
    let stores = state.stores();

    let store = stores.get(store_id).await?;
    ensure_owner(store.user_id, &user, NOT_OWNER)?;

    stores.delete(store_id).await?;
    tracing::info!("User {} deleted store {}", user.id, store_id);
    Ok(ApiResponse::success(Message::new("Store deleted successfully")))
}
