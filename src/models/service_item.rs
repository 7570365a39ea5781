use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bookable service in the tenant's catalog (haircut, manicure, ...).
/// Named `ServiceItem` to avoid colliding with the `services` module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub price_cents: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
