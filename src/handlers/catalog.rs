use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Product, ServiceItem};
use crate::state::AppState;

// ── Services ──

#[derive(Deserialize)]
pub struct ServicePayload {
    pub name: String,
    pub duration_minutes: i64,
    pub price_cents: i64,
}

#[derive(Serialize)]
pub struct ServiceResponse {
    id: String,
    name: String,
    duration_minutes: i64,
    price_cents: i64,
}

impl From<ServiceItem> for ServiceResponse {
    fn from(s: ServiceItem) -> Self {
        ServiceResponse {
            id: s.id,
            name: s.name,
            duration_minutes: s.duration_minutes,
            price_cents: s.price_cents,
        }
    }
}

// GET /api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let services = {
        let db = state.db.lock().unwrap();
        queries::get_services(&db, &tenant.id)?
    };

    Ok(Json(services.into_iter().map(Into::into).collect()))
}

// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ServicePayload>,
) -> Result<Json<ServiceResponse>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("service name must not be empty".into()));
    }
    if payload.duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "duration_minutes must be positive".into(),
        ));
    }

    let now = Utc::now().naive_utc();
    let service = ServiceItem {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant.id,
        name: payload.name.trim().to_string(),
        duration_minutes: payload.duration_minutes,
        price_cents: payload.price_cents,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_service(&db, &service)?;
    }

    Ok(Json(service.into()))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<ServicePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    if payload.duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "duration_minutes must be positive".into(),
        ));
    }

    let now = Utc::now().naive_utc();
    let service = ServiceItem {
        id: id.clone(),
        tenant_id: tenant.id,
        name: payload.name,
        duration_minutes: payload.duration_minutes,
        price_cents: payload.price_cents,
        created_at: now,
        updated_at: now,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_service(&db, &service)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("service {id}")));
    }
    Ok(Json(serde_json::json!({ "updated": true })))
}

// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_service(&db, &tenant.id, &id)?
    };

    if !deleted {
        return Err(AppError::NotFound(format!("service {id}")));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ── Products ──

#[derive(Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
}

#[derive(Serialize)]
pub struct ProductResponse {
    id: String,
    name: String,
    price_cents: i64,
    stock_quantity: i64,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            price_cents: p.price_cents,
            stock_quantity: p.stock_quantity,
        }
    }
}

// GET /api/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let products = {
        let db = state.db.lock().unwrap();
        queries::get_products(&db, &tenant.id)?
    };

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

// POST /api/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductResponse>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name must not be empty".into()));
    }

    let now = Utc::now().naive_utc();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant.id,
        name: payload.name.trim().to_string(),
        price_cents: payload.price_cents,
        stock_quantity: payload.stock_quantity,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_product(&db, &product)?;
    }

    Ok(Json(product.into()))
}

// PUT /api/products/:id
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let now = Utc::now().naive_utc();
    let product = Product {
        id: id.clone(),
        tenant_id: tenant.id,
        name: payload.name,
        price_cents: payload.price_cents,
        stock_quantity: payload.stock_quantity,
        created_at: now,
        updated_at: now,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_product(&db, &product)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    Ok(Json(serde_json::json!({ "updated": true })))
}

// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_product(&db, &tenant.id, &id)?
    };

    if !deleted {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
