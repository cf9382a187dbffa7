use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub buyer_name: Option<String>,
    pub total_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One purchased product, priced at the moment of sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub sale_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub seller_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub products: Vec<SaleItem>,
}

impl SaleDetail {
    /// Buyer, any seller on the sale, or nobody else
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sale.buyer_id == Some(user_id)
            || self.products.iter().any(|item| item.seller_id == Some(user_id))
    }
}

/// Requested product and quantity when placing a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub product_id: Uuid,
    pub quantity: i32,
}
