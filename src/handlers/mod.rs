pub mod appointments;
pub mod availability;
pub mod catalog;
pub mod clients;
pub mod financials;
pub mod health;
pub mod professionals;
pub mod tenants;

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::models::Tenant;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> &str {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .strip_prefix("Bearer ")
        .unwrap_or("")
}

/// Resolves the caller's bearer token to a tenant. All tenant data access
/// below this point is scoped by the returned tenant's id.
pub(crate) fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Tenant, AppError> {
    let token = bearer_token(headers);
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let db = state.db.lock().unwrap();
    crate::db::queries::get_tenant_by_token(&db, token)
        .map_err(AppError::Internal)?
        .ok_or(AppError::Unauthorized)
}
