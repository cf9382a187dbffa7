use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{AccessLevel, AccessLevelWithUsers};
use crate::database::DatabaseError;
use crate::types::Role;

pub struct AccessLevelService {
    pool: PgPool,
}

impl AccessLevelService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<AccessLevel>, DatabaseError> {
        let level = sqlx::query_as::<_, AccessLevel>(
            "SELECT id, name, created_at FROM access_levels WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(level)
    }

    pub async fn create(&self, name: &str) -> Result<AccessLevel, DatabaseError> {
        let level = sqlx::query_as::<_, AccessLevel>(
            "INSERT INTO access_levels (id, name) VALUES ($1, $2) RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(level)
    }

    pub async fn list_with_users(&self) -> Result<Vec<AccessLevelWithUsers>, DatabaseError> {
        let levels = sqlx::query_as::<_, AccessLevelWithUsers>(
            r#"
            SELECT al.id, al.name,
                   COALESCE(array_agg(u.name ORDER BY u.name) FILTER (WHERE u.name IS NOT NULL), '{}') AS users
            FROM access_levels al
            LEFT JOIN user_access_levels ual ON ual.access_level_id = al.id
            LEFT JOIN users u ON u.id = ual.user_id
            GROUP BY al.id
            ORDER BY al.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(levels)
    }

    /// Insert the built-in roles that are missing; returns how many were added
    pub async fn ensure_defaults(&self) -> Result<u64, DatabaseError> {
        let mut added = 0;
        for role in Role::ALL {
            let result = sqlx::query(
                "INSERT INTO access_levels (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
            added += result.rows_affected();
        }
        Ok(added)
    }
}
