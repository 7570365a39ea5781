use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{EntryType, FinancialEntry};
use crate::state::AppState;

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {s}")))
}

#[derive(Serialize)]
pub struct FinancialEntryResponse {
    id: String,
    entry_type: String,
    description: String,
    amount_cents: i64,
    entry_date: String,
    appointment_id: Option<String>,
}

impl From<FinancialEntry> for FinancialEntryResponse {
    fn from(e: FinancialEntry) -> Self {
        FinancialEntryResponse {
            id: e.id,
            entry_type: e.entry_type.as_str().to_string(),
            description: e.description,
            amount_cents: e.amount_cents,
            entry_date: e.entry_date.format("%Y-%m-%d").to_string(),
            appointment_id: e.appointment_id,
        }
    }
}

#[derive(Deserialize)]
pub struct FinancialsQuery {
    pub from: String,
    pub to: String,
}

// GET /api/financials?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FinancialsQuery>,
) -> Result<Json<Vec<FinancialEntryResponse>>, AppError> {
    let tenant = authenticate(&state, &headers)?;
    let from = parse_date(&query.from)?;
    let to = parse_date(&query.to)?;

    let entries = {
        let db = state.db.lock().unwrap();
        queries::get_financial_entries_in_range(&db, &tenant.id, from, to)?
    };

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[derive(Deserialize)]
pub struct CreateEntryPayload {
    pub entry_type: String,
    pub description: String,
    pub amount_cents: i64,
    pub entry_date: String,
}

// POST /api/financials
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<Json<FinancialEntryResponse>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let entry_type = match payload.entry_type.as_str() {
        "income" => EntryType::Income,
        "expense" => EntryType::Expense,
        other => {
            return Err(AppError::BadRequest(format!(
                "entry_type must be income or expense, got {other}"
            )))
        }
    };
    if payload.amount_cents <= 0 {
        return Err(AppError::BadRequest("amount_cents must be positive".into()));
    }
    let entry_date = parse_date(&payload.entry_date)?;

    let entry = FinancialEntry {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant.id,
        entry_type,
        description: payload.description,
        amount_cents: payload.amount_cents,
        entry_date,
        appointment_id: None,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_financial_entry(&db, &entry)?;
    }

    Ok(Json(entry.into()))
}
