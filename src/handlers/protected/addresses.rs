use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use validator::Validate;

use crate::database::models::{Address, AddressChanges, NewAddress};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::state::AppState;

use super::utils::{ensure_owner_or_admin, parse_id, Message};

const NOT_OWNER: &str = "This address does not belong to you";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Neighborhood is required"))]
    pub neighborhood: String,
    #[serde(alias = "CEP")]
    #[validate(length(min = 8, max = 9, message = "CEP must have 8 digits"))]
    pub cep: String,
    #[validate(length(min = 2, message = "State is required"))]
    pub state: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAddressRequest {
    #[validate(length(min = 1, message = "Street cannot be empty"))]
    pub street: Option<String>,
    #[validate(length(min = 1, message = "City cannot be empty"))]
    pub city: Option<String>,
    #[validate(length(min = 1, message = "Neighborhood cannot be empty"))]
    pub neighborhood: Option<String>,
    #[serde(alias = "CEP")]
    #[validate(length(min = 8, max = 9, message = "CEP must have 8 digits"))]
    pub cep: Option<String>,
    #[validate(length(min = 2, message = "State cannot be empty"))]
    pub state: Option<String>,
}

/// POST /create-address
pub async fn create_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<CreateAddressRequest>,
) -> ApiResult<Address> {
    let address = state
        .addresses()
        .create(
            user.id,
            NewAddress {
                street: payload.street,
                city: payload.city,
                neighborhood: payload.neighborhood,
                cep: payload.cep,
                state: payload.state,
            },
        )
        .await?;

    Ok(ApiResponse::created(address))
}

/// GET /get-address - the caller's addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Address>> {
    let addresses = state.addresses().list_for_user(user.id).await?;
    Ok(ApiResponse::success(addresses))
}

/// PUT /update-address/:addressId
pub async fn update_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(address_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateAddressRequest>,
) -> ApiResult<Address> {
    let address_id = parse_id(&address_id, "addressId")?;
    let addresses = state.addresses();

    let existing = addresses
        .find(address_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Address not found"))?;
    ensure_owner_or_admin(existing.user_id, &user, NOT_OWNER)?;

    let updated = addresses
        .update(
            address_id,
            AddressChanges {
                street: payload.street,
                city: payload.city,
                neighborhood: payload.neighborhood,
                cep: payload.cep,
                state: payload.state,
            },
        )
        .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /delete-address/:addressId
pub async fn delete_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(address_id): Path<String>,
) -> ApiResult<Message> {
    let address_id = parse_id(&address_id, "addressId")?;
    let addresses = state.addresses();

    let existing = addresses
        .find(address_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Address not found"))?;
    ensure_owner_or_admin(existing.user_id, &user, NOT_OWNER)?;

    addresses.delete(address_id).await?;
    Ok(ApiResponse::success(Message::new("Address deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_upper_case_cep_key() {
        let payload: CreateAddressRequest = serde_json::from_value(serde_json::json!({
            "street": "Rua das Flores, 10",
            "city": "Recife",
            "neighborhood": "Boa Vista",
            "CEP": "50050-000",
            "state": "PE"
        }))
        .unwrap();

        assert_eq!(payload.cep, "50050-000");
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn short_cep_fails_validation() {
        let payload = UpdateAddressRequest {
            street: None,
            city: None,
            neighborhood: None,
            cep: Some("123".into()),
            state: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("cep"));
    }
}
