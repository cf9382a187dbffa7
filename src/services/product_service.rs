use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{NewProduct, Product, ProductChanges, ProductWithStore};
use crate::database::DatabaseError;

const PRODUCT_COLUMNS: &str = "id, name, description, price, quantity, image, store_id, created_at, updated_at";

const PRODUCT_WITH_STORE: &str = r#"
    SELECT p.id, p.name, p.description, p.price, p.quantity, p.image, p.store_id,
           p.created_at, p.updated_at,
           s.name AS store_name, s.user_id AS store_owner_id
    FROM products p
    JOIN stores s ON s.id = p.store_id
"#;

pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, store_id: Uuid, product: NewProduct) -> Result<Product, DatabaseError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (id, name, description, price, quantity, image, store_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .bind(product.quantity)
        .bind(product.image)
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn list_all(&self) -> Result<Vec<ProductWithStore>, DatabaseError> {
        let products = sqlx::query_as::<_, ProductWithStore>(&format!("{PRODUCT_WITH_STORE} ORDER BY p.created_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn list_by_store(&self, store_id: Uuid) -> Result<Vec<ProductWithStore>, DatabaseError> {
        let products = sqlx::query_as::<_, ProductWithStore>(&format!(
            "{PRODUCT_WITH_STORE} WHERE p.store_id = $1 ORDER BY p.created_at DESC"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<ProductWithStore>, DatabaseError> {
        let product = sqlx::query_as::<_, ProductWithStore>(&format!("{PRODUCT_WITH_STORE} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Fetch the product with its store or fail with NotFound
    pub async fn get(&self, id: Uuid) -> Result<ProductWithStore, DatabaseError> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Product not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Product, DatabaseError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                quantity = COALESCE($5, quantity),
                updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.quantity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Product not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Product not found".to_string()));
        }
        Ok(())
    }
}
