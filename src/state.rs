use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenKeys;
use crate::config::AppConfig;
use crate::services::{AccessLevelService, AddressService, ProductService, SaleService, StoreService, UserService};
use crate::storage::{ImageStorage, UploadPolicy};

/// Process-wide handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub storage: Arc<dyn ImageStorage>,
    pub tokens: TokenKeys,
    pub upload_policy: UploadPolicy,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, storage: Arc<dyn ImageStorage>) -> Self {
        Self {
            tokens: TokenKeys::from_config(&config.security),
            upload_policy: UploadPolicy::from_config(&config.upload),
            config: Arc::new(config),
            pool,
            storage,
        }
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    pub fn access_levels(&self) -> AccessLevelService {
        AccessLevelService::new(self.pool.clone())
    }

    pub fn addresses(&self) -> AddressService {
        AddressService::new(self.pool.clone())
    }

    pub fn stores(&self) -> StoreService {
        StoreService::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(self.pool.clone())
    }
}
