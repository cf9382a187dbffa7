use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::product::Product;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public store listing with the owner's display name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoreListing {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreWithProducts {
    #[serde(flatten)]
    pub store: Store,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}
