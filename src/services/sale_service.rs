use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::models::{Sale, SaleDetail, SaleItem, SaleLine, MAX_AMOUNT};
use crate::database::DatabaseError;

const SALE_SELECT: &str = r#"
    SELECT s.id, s.buyer_id, u.name AS buyer_name, s.total_value, s.created_at, s.updated_at
    FROM sales s
    LEFT JOIN users u ON u.id = s.buyer_id
"#;

/// Product row locked while a sale is being placed
#[derive(Debug, FromRow)]
struct StockRow {
    id: Uuid,
    name: String,
    price: Decimal,
    quantity: i32,
    owner_id: Uuid,
}

pub struct SaleService {
    pool: PgPool,
}

impl SaleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Place a sale for `buyer_id`.
    ///
    /// Runs in one transaction: every product row is locked, checked for
    /// stock and ownership, priced, and decremented before the sale commits.
    /// Rows are locked in `product_id` order so concurrent sales over the
    /// same products queue instead of deadlocking.
    pub async fn create(&self, buyer_id: Uuid, lines: &[SaleLine]) -> Result<SaleDetail, DatabaseError> {
        let lines = merge_lines(lines)?;
        let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT p.id, p.name, p.price, p.quantity, s.user_id AS owner_id
            FROM products p
            JOIN stores s ON s.id = p.store_id
            WHERE p.id = ANY($1)
            ORDER BY p.id
            FOR UPDATE OF p
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let mut by_id: HashMap<Uuid, StockRow> = rows.into_iter().map(|row| (row.id, row)).collect();

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let row = by_id
                .remove(&line.product_id)
                .ok_or_else(|| DatabaseError::NotFound(format!("Product {} not found", line.product_id)))?;

            if row.owner_id == buyer_id {
                return Err(DatabaseError::Rejected(format!(
                    "Cannot buy '{}' from your own store",
                    row.name
                )));
            }
            if row.quantity < line.quantity {
                return Err(DatabaseError::Rejected(format!(
                    "Insufficient stock for '{}': {} available",
                    row.name, row.quantity
                )));
            }
            priced.push((row, line.quantity));
        }

        let total_value = sale_total(priced.iter().map(|(row, quantity)| (row.price, *quantity)))?;

        let sale_id = Uuid::new_v4();
        sqlx::query("INSERT INTO sales (id, buyer_id, total_value) VALUES ($1, $2, $3)")
            .bind(sale_id)
            .bind(buyer_id)
            .bind(total_value)
            .execute(&mut *tx)
            .await?;

        for (row, quantity) in &priced {
            sqlx::query(
                r#"
                INSERT INTO sale_products (id, sale_id, product_id, product_name, seller_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(sale_id)
            .bind(row.id)
            .bind(&row.name)
            .bind(row.owner_id)
            .bind(quantity)
            .bind(row.price)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE products SET quantity = quantity - $2, updated_at = now() WHERE id = $1")
                .bind(row.id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!("Sale {} placed by {} for {}", sale_id, buyer_id, total_value);

        self.find_detail(sale_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Sale not found".to_string()))
    }

    pub async fn list_all(&self) -> Result<Vec<SaleDetail>, DatabaseError> {
        let sales = sqlx::query_as::<_, Sale>(&format!("{SALE_SELECT} ORDER BY s.created_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        self.attach_items(sales).await
    }

    pub async fn list_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<SaleDetail>, DatabaseError> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SALE_SELECT} WHERE s.buyer_id = $1 ORDER BY s.created_at DESC"
        ))
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(sales).await
    }

    /// Sales that include at least one product sold by `seller_id`
    pub async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<SaleDetail>, DatabaseError> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"{SALE_SELECT}
            WHERE EXISTS (
                SELECT 1 FROM sale_products sp WHERE sp.sale_id = s.id AND sp.seller_id = $1
            )
            ORDER BY s.created_at DESC"#
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(sales).await
    }

    pub async fn find_detail(&self, sale_id: Uuid) -> Result<Option<SaleDetail>, DatabaseError> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SALE_SELECT} WHERE s.id = $1"))
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;

        match sale {
            Some(sale) => Ok(self.attach_items(vec![sale]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn attach_items(&self, sales: Vec<Sale>) -> Result<Vec<SaleDetail>, DatabaseError> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, seller_id, quantity, unit_price
            FROM sale_products
            WHERE sale_id = ANY($1)
            ORDER BY product_name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<Uuid, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id).or_default().push(item);
        }

        Ok(sales
            .into_iter()
            .map(|sale| {
                let products = by_sale.remove(&sale.id).unwrap_or_default();
                SaleDetail { sale, products }
            })
            .collect())
    }
}

/// Sum of `price * quantity`, refused once it no longer fits `sales.total_value`
pub fn sale_total(lines: impl IntoIterator<Item = (Decimal, i32)>) -> Result<Decimal, DatabaseError> {
    let mut total = Decimal::ZERO;
    for (price, quantity) in lines {
        total = price
            .checked_mul(Decimal::from(quantity))
            .and_then(|subtotal| total.checked_add(subtotal))
            .filter(|total| *total < MAX_AMOUNT)
            .ok_or_else(|| DatabaseError::Rejected("Sale total is too large".to_string()))?;
    }
    Ok(total)
}

/// Collapse repeated products into one line per product, ordered by `product_id`
pub fn merge_lines(lines: &[SaleLine]) -> Result<Vec<SaleLine>, DatabaseError> {
    let mut merged: Vec<SaleLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| DatabaseError::Rejected("Quantity is too large".to_string()))?;
            }
            None => merged.push(*line),
        }
    }
    merged.sort_by_key(|line| line.product_id);
    Ok(merged)
}
