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
use crate::models::Client;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ClientPayload {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct ClientResponse {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        ClientResponse {
            id: c.id,
            name: c.name,
            phone: c.phone,
            email: c.email,
            notes: c.notes,
            created_at: c.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: c.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// GET /api/clients
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let clients = {
        let db = state.db.lock().unwrap();
        queries::get_clients(&db, &tenant.id)?
    };

    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

// POST /api/clients
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<ClientResponse>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("client name must not be empty".into()));
    }

    let now = Utc::now().naive_utc();
    let client = Client {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant.id,
        name: payload.name.trim().to_string(),
        phone: payload.phone,
        email: payload.email,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_client(&db, &client)?;
    }

    Ok(Json(client.into()))
}

// PUT /api/clients/:id
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let now = Utc::now().naive_utc();
    let client = Client {
        id: id.clone(),
        tenant_id: tenant.id,
        name: payload.name,
        phone: payload.phone,
        email: payload.email,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_client(&db, &client)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("client {id}")));
    }
    Ok(Json(serde_json::json!({ "updated": true })))
}

// DELETE /api/clients/:id
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_client(&db, &tenant.id, &id)?
    };

    if !deleted {
        return Err(AppError::NotFound(format!("client {id}")));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
