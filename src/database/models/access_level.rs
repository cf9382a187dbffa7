use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AccessLevel {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Access level with the names of the users holding it
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AccessLevelWithUsers {
    pub id: Uuid,
    pub name: String,
    pub users: Vec<String>,
}
