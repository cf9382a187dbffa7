use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Address {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub neighborhood: String,
    pub cep: String,
    pub state: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street: String,
    pub city: String,
    pub neighborhood: String,
    pub cep: String,
    pub state: String,
}

#[derive(Debug, Clone, Default)]
pub struct AddressChanges {
    pub street: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub cep: Option<String>,
    pub state: Option<String>,
}
