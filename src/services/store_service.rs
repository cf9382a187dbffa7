use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Product, Store, StoreChanges, StoreListing, StoreWithProducts};
use crate::database::DatabaseError;

const STORE_COLUMNS: &str = "id, name, description, user_id, created_at, updated_at";

pub struct StoreService {
    pool: PgPool,
}

impl StoreService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, name: &str, description: &str) -> Result<Store, DatabaseError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO stores (id, name, description, user_id) VALUES ($1, $2, $3, $4) RETURNING {STORE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(store)
    }

    pub async fn list_all(&self) -> Result<Vec<StoreListing>, DatabaseError> {
        let stores = sqlx::query_as::<_, StoreListing>(
            r#"
            SELECT s.id, s.name, u.name AS owner_name
            FROM stores s
            JOIN users u ON u.id = s.user_id
            ORDER BY s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stores)
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Store>, DatabaseError> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stores)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Store>, DatabaseError> {
        let store = sqlx::query_as::<_, Store>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(store)
    }

    /// Fetch the store or fail with NotFound
    pub async fn get(&self, id: Uuid) -> Result<Store, DatabaseError> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Store not found".to_string()))
    }

    pub async fn with_products(&self, store: Store) -> Result<StoreWithProducts, DatabaseError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, quantity, image, store_id, created_at, updated_at
            FROM products
            WHERE store_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(store.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(StoreWithProducts { store, products })
    }

    pub async fn update(&self, id: Uuid, changes: StoreChanges) -> Result<Store, DatabaseError> {
        sqlx::query_as::<_, Store>(&format!(
            r#"
            UPDATE stores SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Store not found".to_string()))
    }

    /// Deletes the store; its products go with it
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Store not found".to_string()));
        }
        Ok(())
    }
}
