use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Address, AddressChanges, NewAddress};
use crate::database::DatabaseError;

const ADDRESS_COLUMNS: &str = "id, street, city, neighborhood, cep, state, user_id, created_at, updated_at";

pub struct AddressService {
    pool: PgPool,
}

impl AddressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, address: NewAddress) -> Result<Address, DatabaseError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            r#"
            INSERT INTO addresses (id, street, city, neighborhood, cep, state, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(address.street)
        .bind(address.city)
        .bind(address.neighborhood)
        .bind(address.cep)
        .bind(address.state)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(address)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Address>, DatabaseError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(addresses)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Address>, DatabaseError> {
        let address = sqlx::query_as::<_, Address>(&format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(address)
    }

    pub async fn update(&self, id: Uuid, changes: AddressChanges) -> Result<Address, DatabaseError> {
        sqlx::query_as::<_, Address>(&format!(
            r#"
            UPDATE addresses SET
                street = COALESCE($2, street),
                city = COALESCE($3, city),
                neighborhood = COALESCE($4, neighborhood),
                cep = COALESCE($5, cep),
                state = COALESCE($6, state),
                updated_at = now()
            WHERE id = $1
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.street)
        .bind(changes.city)
        .bind(changes.neighborhood)
        .bind(changes.cep)
        .bind(changes.state)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Address not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Address not found".to_string()));
        }
        Ok(())
    }
}
