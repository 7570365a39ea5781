use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
