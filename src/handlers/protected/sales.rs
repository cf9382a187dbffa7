use axum::{
    extract::{Path, State},
    Extension,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{SaleDetail, SaleLine};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::state::AppState;

use super::utils::parse_id;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SaleLineRequest {
    #[serde(rename = "productId", alias = "id")]
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateSaleRequest {
    #[validate(length(min = 1, message = "At least one product is required"), nested)]
    pub products: Vec<SaleLineRequest>,
}

impl CreateSaleRequest {
    fn lines(&self) -> Vec<SaleLine> {
        self.products
            .iter()
            .map(|p| SaleLine {
                product_id: p.product_id,
                quantity: p.quantity,
            })
            .collect()
    }
}

/// POST /create-sale
pub async fn create_sale(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<CreateSaleRequest>,
) -> ApiResult<SaleDetail> {
    let sale = state.sales().create(user.id, &payload.lines()).await?;
    Ok(ApiResponse::created(sale))
}

/// GET /get-all-sale
pub async fn list_sales(State(state): State<AppState>) -> ApiResult<Vec<SaleDetail>> {
    Ok(ApiResponse::success(state.sales().list_all().await?))
}

/// GET /get-details-sale-by-user/:saleId
pub async fn get_sale(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(sale_id): Path<String>,
) -> ApiResult<SaleDetail> {
    let sale_id = parse_id(&sale_id, "saleId")?;

    let sale = state
        .sales()
        .find_detail(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale not found"))?;

    if !user.is_admin() && !sale.involves(user.id) {
        tracing::warn!("User {} tried to read sale {}", user.id, sale_id);
        return Err(ApiError::bad_request("This sale does not belong to you"));
    }

    Ok(ApiResponse::success(sale))
}

/// GET /get-all-sale-by-user - the caller's purchases
pub async fn list_purchases(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<SaleDetail>> {
    Ok(ApiResponse::success(state.sales().list_by_buyer(user.id).await?))
}

/// GET /get-all-sale-by-owner - sales of the caller's products
pub async fn list_seller_sales(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<SaleDetail>> {
    Ok(ApiResponse::success(state.sales().list_by_seller(user.id).await?))
}
