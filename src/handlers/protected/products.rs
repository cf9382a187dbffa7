use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Extension,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::database::models::{NewProduct, Product, ProductChanges, ProductWithStore, MAX_AMOUNT};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::state::AppState;
use crate::storage::{ImageStorage, ImageUpload, UploadPolicy};

use super::utils::{ensure_owner, parse_id, Message};

const NOT_OWNER: &str = "This product's store does not belong to you";

/// Raw fields collected from the multipart body of `create-product`
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    pub image: Option<ImageUpload>,
}

/// A product form that passed validation
#[derive(Debug)]
pub struct ValidProductForm {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image: ImageUpload,
}

impl ProductForm {
    /// Read every field of the form. Images outside the allowed MIME types
    /// are dropped, oversize images abort the read.
    pub async fn read(mut multipart: Multipart, policy: &UploadPolicy) -> Result<Self, ApiError> {
        let mut form = ProductForm::default();

        while let Some(mut field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                "image" => {
                    let content_type = field.content_type().map(str::to_owned);
                    if !policy.accepts(content_type.as_deref()) {
                        tracing::debug!("Skipping upload with content type {:?}", content_type);
                        continue;
                    }

                    let file_name = field.file_name().unwrap_or("image").to_string();
                    let mut buf: Vec<u8> = Vec::new();
                    while let Some(chunk) = field.chunk().await? {
                        policy.check_size(buf.len() + chunk.len())?;
                        buf.extend_from_slice(&chunk);
                    }

                    form.image = Some(ImageUpload {
                        file_name,
                        content_type: content_type.unwrap_or_default(),
                        bytes: Bytes::from(buf),
                    });
                }
                "name" => form.name = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "price" => form.price = Some(field.text().await?),
                "quantity" => form.quantity = Some(field.text().await?),
                other => tracing::debug!("Ignoring unknown form field {}", other),
            }
        }

        Ok(form)
    }

    pub fn validate(self) -> Result<ValidProductForm, ApiError> {
        let mut errors: HashMap<String, String> = HashMap::new();

        let name = self.name.map(|n| n.trim().to_string()).unwrap_or_default();
        if name.chars().count() < 3 {
            errors.insert("name".into(), "Name must be at least 3 characters".into());
        }

        let price = match self.price.as_deref().map(str::trim) {
            None | Some("") => {
                errors.insert("price".into(), "Price is required".into());
                None
            }
            Some(raw) => match parse_price(raw) {
                Ok(price) => Some(price),
                Err(message) => {
                    errors.insert("price".into(), message.into());
                    None
                }
            },
        };

        let quantity = match self.quantity.as_deref().map(str::trim) {
            None | Some("") => {
                errors.insert("quantity".into(), "Quantity is required".into());
                None
            }
            Some(raw) => match raw.parse::<i32>() {
                Ok(q) if q >= 0 => Some(q),
                _ => {
                    errors.insert("quantity".into(), "Quantity must be a whole number of at least 0".into());
                    None
                }
            },
        };

        if self.image.is_none() {
            errors.insert("image".into(), "An image (jpeg or png) is required".into());
        }

        match (price, quantity, self.image) {
            (Some(price), Some(quantity), Some(image)) if errors.is_empty() => Ok(ValidProductForm {
                name,
                description: self.description.unwrap_or_default(),
                price,
                quantity,
                image,
            }),
            _ => Err(ApiError::validation_error("Invalid product form", Some(errors))),
        }
    }
}

/// Positive decimal, rounded to cents
fn parse_price(raw: &str) -> Result<Decimal, &'static str> {
    let price = Decimal::from_str(raw).map_err(|_| "Price must be a number")?;
    check_price(price)
}

fn check_price(price: Decimal) -> Result<Decimal, &'static str> {
    let price = price.round_dp(2);
    if price <= Decimal::ZERO {
        return Err("Price must be greater than 0");
    }
    if price >= MAX_AMOUNT {
        return Err("Price must be less than 10000000000");
    }
    Ok(price)
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Quantity must be at least 0"))]
    pub quantity: Option<i32>,
}

/// POST /create-product/:storeId (multipart)
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(store_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Product> {
    let store_id = parse_id(&store_id, "storeId")?;
    let multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let form = ProductForm::read(multipart, &state.upload_policy).await?.validate()?;

    let store = state.stores().get(store_id).await?;
    ensure_owner(store.user_id, &user, "This store does not belong to you")?;

    let ValidProductForm {
        name,
        description,
        price,
        quantity,
        image: upload,
    } = form;
    let products = state.products();
    let product = with_stored_image(state.storage.as_ref(), &upload, |image| async move {
        products
            .create(
                store_id,
                NewProduct {
                    name,
                    description,
                    price,
                    quantity,
                    image,
                },
            )
            .await
    })
    .await?;

    tracing::info!("Product {} listed in store {}", product.id, store_id);
    Ok(ApiResponse::created(product))
}

/// Store the image, then run `insert` with its URL. A failed insert discards the image again.
async fn with_stored_image<T, E, F, Fut>(
    storage: &dyn ImageStorage,
    image: &ImageUpload,
    insert: F,
) -> Result<T, ApiError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    ApiError: From<E>,
{
    let stored = storage.store(image).await?;

    match insert(stored.url).await {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Err(cleanup) = storage.discard(&stored.key).await {
                tracing::warn!("Could not discard image {}: {}", stored.key, cleanup);
            }
            Err(e.into())
        }
    }
}

/// GET /get-all-product
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<ProductWithStore>> {
    Ok(ApiResponse::success(state.products().list_all().await?))
}

/// GET /get-all-product/store/:storeId
pub async fn list_store_products(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> ApiResult<Vec<ProductWithStore>> {
    let store_id = parse_id(&store_id, "storeId")?;
    state.stores().get(store_id).await?;
    Ok(ApiResponse::success(state.products().list_by_store(store_id).await?))
}

/// GET /get-unique-product/:productId
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<ProductWithStore> {
    let product_id = parse_id(&product_id, "productId")?;
    Ok(ApiResponse::success(state.products().get(product_id).await?))
}

/// PUT /update-product/:productId
pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateProductRequest>,
) -> ApiResult<Product> {
    let product_id = parse_id(&product_id, "productId")?;
    let price = payload
        .price
        .map(check_price)
        .transpose()
        .map_err(|message| ApiError::field_error("price", message))?;

    let products = state.products();
    let existing = products.get(product_id).await?;
    ensure_owner(existing.store_owner_id, &user, NOT_OWNER)?;

    let updated = products
        .update(
            product_id,
            ProductChanges {
                name: payload.name,
                description: payload.description,
                price,
                quantity: payload.quantity,
            },
        )
        .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /delete-product/:productId
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> ApiResult<Message> {
    let product_id = parse_id(&product_id, "productId")?;
    let products = state.products();

    let existing = products.get(product_id).await?;
    ensure_owner(existing.store_owner_id, &user, NOT_OWNER)?;

    products.delete(product_id).await?;
    Ok(ApiResponse::success(Message::new("Product deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageUpload {
        ImageUpload {
            file_name: "pao.png".into(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    fn form(price: &str, quantity: &str) -> ProductForm {
        ProductForm {
            name: Some("Pao de queijo".into()),
            description: Some("Fornada do dia".into()),
            price: Some(price.into()),
            quantity: Some(quantity.into()),
            image: Some(image()),
        }
    }

    #[test]
    fn valid_form_rounds_price_to_cents() {
        let valid = form("4.999", "12").validate().unwrap();
        assert_eq!(valid.price, Decimal::from_str("5.00").unwrap());
        assert_eq!(valid.quantity, 12);
        assert_eq!(valid.name, "Pao de queijo");
    }

    #[test]
    fn rejects_non_positive_price_and_negative_quantity() {
        let err = form("0", "-1").validate().unwrap_err();
        let body = err.to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["price"], "Price must be greater than 0");
        assert!(body["field_errors"]["quantity"].is_string());
    }

    #[test]
    fn missing_image_is_a_field_error() {
        let mut f = form("10.50", "1");
        f.image = None;
        let body = f.validate().unwrap_err().to_json();
        assert!(body["field_errors"]["image"].is_string());
        assert!(body["field_errors"].get("price").is_none());
    }

    #[test]
    fn non_numeric_price_is_reported() {
        let body = form("abc", "1").validate().unwrap_err().to_json();
        assert_eq!(body["field_errors"]["price"], "Price must be a number");
    }

    #[test]
    fn price_must_fit_the_price_column() {
        let body = form("100000000000", "1").validate().unwrap_err().to_json();
        assert_eq!(body["field_errors"]["price"], "Price must be less than 10000000000");

        assert!(check_price(Decimal::from_str("10000000000").unwrap()).is_err());
        assert!(check_price(Decimal::from_str("9999999999.995").unwrap()).is_err());
        assert_eq!(
            check_price(Decimal::from_str("9999999999.99").unwrap()),
            Ok(Decimal::from_str("9999999999.99").unwrap())
        );
    }

    #[test]
    fn update_price_must_stay_positive() {
        assert!(check_price(Decimal::from_str("-3").unwrap()).is_err());
        assert!(check_price(Decimal::from_str("0.004").unwrap()).is_err());
        assert_eq!(check_price(Decimal::from_str("19.9").unwrap()), Ok(Decimal::from_str("19.90").unwrap()));
    }

    fn scratch_storage() -> (std::path::PathBuf, crate::storage::LocalStorage) {
        let dir = std::env::temp_dir().join(format!("banca-products-{}", uuid::Uuid::new_v4()));
        let storage = crate::storage::LocalStorage::new(&dir, "http://localhost/uploads");
        (dir, storage)
    }

    fn files_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_image_behind() {
        let (dir, storage) = scratch_storage();

        let result: Result<(), ApiError> = with_stored_image(&storage, &image(), |url| async move {
            assert!(url.starts_with("http://localhost/uploads/"));
            Err(crate::database::DatabaseError::Rejected("insert failed".into()))
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(files_in(&dir), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn successful_insert_keeps_the_image() {
        let (dir, storage) = scratch_storage();

        let url = with_stored_image(&storage, &image(), |url| async move {
            Ok::<_, crate::database::DatabaseError>(url)
        })
        .await
        .unwrap();

        assert!(url.ends_with("-pao.png"));
        assert_eq!(files_in(&dir), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
