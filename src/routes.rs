use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{SecurityConfig, StorageBackend};
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::{require_roles, RoleGuard};
use crate::state::AppState;
use crate::types::{Role, ADMIN_ONLY, BUYERS, EVERYONE, SELLERS};

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Role-gated groups
        .merge(guarded(&state, ADMIN_ONLY, admin_routes()))
        .merge(guarded(&state, EVERYONE, member_routes()))
        .merge(guarded(&state, SELLERS, seller_routes()))
        .merge(guarded(&state, BUYERS, buyer_routes()));

    if config.upload.backend == StorageBackend::Local {
        router = router.nest_service("/uploads", ServeDir::new(&config.upload.upload_dir));
    }

    let mut router = router
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

/// Attach the role guard to every route of a group
fn guarded(state: &AppState, allowed: &'static [Role], routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        RoleGuard::new(&state.tokens, allowed),
        require_roles,
    ))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(public::sign_in))
        .route("/user", post(public::create_user))
}

fn admin_routes() -> Router<AppState> {
    use protected::{access_levels, users};

    Router::new()
        .route(
            "/access-level",
            post(access_levels::create_access_level).get(access_levels::list_access_levels),
        )
        .route("/user", get(users::list_users))
}

fn member_routes() -> Router<AppState> {
    use protected::{addresses, products, sales, stores, users};

    Router::new()
        // Own profile
        .route("/unique-user", get(users::get_profile))
        .route("/update-user", put(users::update_profile))
        .route("/delete-user", delete(users::delete_profile))
        // Addresses
        .route("/create-address", post(addresses::create_address))
        .route("/get-address", get(addresses::list_addresses))
        .route("/update-address/:addressId", put(addresses::update_address))
        .route("/delete-address/:addressId", delete(addresses::delete_address))
        // Catalogue
        .route("/stores", get(stores::list_stores))
        .route("/get-all-product", get(products::list_products))
        .route("/get-all-product/store/:storeId", get(products::list_store_products))
        .route("/get-unique-product/:productId", get(products::get_product))
        .route("/get-details-sale-by-user/:saleId", get(sales::get_sale))
}

fn seller_routes() -> Router<AppState> {
    use protected::{products, sales, stores};

    Router::new()
        .route("/store", post(stores::create_store))
        .route("/get-all-store-by-owner", get(stores::list_own_stores))
        .route("/get-unique-store-by-owner/:storeId", get(stores::get_own_store))
        .route("/update-store/:storeId", put(stores::update_store))
        .route(
            "/delete-store/:storeId",
            delete(stores::delete_store).get(stores::delete_store),
        )
        .route("/create-product/:storeId", post(products::create_product))
        .route("/update-product/:productId", put(products::update_product))
        .route("/delete-product/:productId", delete(products::delete_product))
        .route("/get-all-sale", get(sales::list_sales))
        .route("/get-all-sale-by-owner", get(sales::list_seller_sales))
}

fn buyer_routes() -> Router<AppState> {
    use protected::sales;

    Router::new()
        .route("/create-sale", post(sales::create_sale))
        .route("/get-all-sale-by-user", get(sales::list_purchases))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let allow_origin = if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Banca API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Marketplace backend for bancas, products, addresses and sales",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/sign-in, POST /user (public)",
                "users": "/user, /unique-user, /update-user, /delete-user",
                "access_levels": "/access-level (adm)",
                "addresses": "/create-address, /get-address, /update-address/:addressId, /delete-address/:addressId",
                "stores": "/store, /stores, /get-all-store-by-owner, /get-unique-store-by-owner/:storeId, /update-store/:storeId, /delete-store/:storeId",
                "products": "/create-product/:storeId, /get-all-product[/store/:storeId], /get-unique-product/:productId, /update-product/:productId, /delete-product/:productId",
                "sales": "/create-sale, /get-all-sale, /get-all-sale-by-user, /get-all-sale-by-owner, /get-details-sale-by-user/:saleId",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unreachable"
                    }
                })),
            )
        }
    }
}
