use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bearer_token;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Tenant;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateTenantPayload {
    pub name: String,
}

#[derive(Serialize)]
pub struct TenantResponse {
    id: String,
    name: String,
    api_token: String,
}

// POST /api/tenants — instance admin only.
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<Json<TenantResponse>, AppError> {
    if bearer_token(&headers) != state.config.admin_token {
        return Err(AppError::Unauthorized);
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("tenant name must not be empty".into()));
    }

    let tenant = Tenant {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        api_token: Uuid::new_v4().to_string(),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_tenant(&db, &tenant)?;
    }

    tracing::info!(tenant_id = %tenant.id, "created tenant");

    Ok(Json(TenantResponse {
        id: tenant.id,
        name: tenant.name,
        api_token: tenant.api_token,
    }))
}
