use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::professional::{format_hhmm, parse_hhmm};
use crate::models::Professional;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProfessionalPayload {
    pub name: String,
    pub work_start_time: Option<String>,
    pub work_end_time: Option<String>,
    pub lunch_start_time: Option<String>,
    pub lunch_end_time: Option<String>,
}

#[derive(Serialize)]
pub struct ProfessionalResponse {
    id: String,
    name: String,
    work_start_time: Option<String>,
    work_end_time: Option<String>,
    lunch_start_time: Option<String>,
    lunch_end_time: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Professional> for ProfessionalResponse {
    fn from(p: Professional) -> Self {
        ProfessionalResponse {
            id: p.id,
            name: p.name,
            work_start_time: p.work_start_time.as_ref().map(format_hhmm),
            work_end_time: p.work_end_time.as_ref().map(format_hhmm),
            lunch_start_time: p.lunch_start_time.as_ref().map(format_hhmm),
            lunch_end_time: p.lunch_end_time.as_ref().map(format_hhmm),
            created_at: p.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: p.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

struct ScheduleBounds {
    work_start: Option<NaiveTime>,
    work_end: Option<NaiveTime>,
    lunch_start: Option<NaiveTime>,
    lunch_end: Option<NaiveTime>,
}

/// Parses and validates the schedule fields of a payload. The engine never
/// repairs bad bounds, so the write path is where they are rejected:
/// ordered work interval, ordered lunch interval, lunch contained in the
/// work interval.
fn parse_schedule(payload: &ProfessionalPayload) -> Result<ScheduleBounds, AppError> {
    let parse = |field: &Option<String>, name: &str| -> Result<Option<NaiveTime>, AppError> {
        field
            .as_ref()
            .map(|s| parse_hhmm(s).map_err(|e| AppError::BadRequest(format!("{name}: {e}"))))
            .transpose()
    };

    let bounds = ScheduleBounds {
        work_start: parse(&payload.work_start_time, "work_start_time")?,
        work_end: parse(&payload.work_end_time, "work_end_time")?,
        lunch_start: parse(&payload.lunch_start_time, "lunch_start_time")?,
        lunch_end: parse(&payload.lunch_end_time, "lunch_end_time")?,
    };

    if let (Some(ws), Some(we)) = (bounds.work_start, bounds.work_end) {
        if ws >= we {
            return Err(AppError::BadRequest(
                "work_start_time must be before work_end_time".into(),
            ));
        }
    }
    if let (Some(ls), Some(le)) = (bounds.lunch_start, bounds.lunch_end) {
        if ls >= le {
            return Err(AppError::BadRequest(
                "lunch_start_time must be before lunch_end_time".into(),
            ));
        }
        if let (Some(ws), Some(we)) = (bounds.work_start, bounds.work_end) {
            if ls < ws || le > we {
                return Err(AppError::BadRequest(
                    "lunch break must fall within business hours".into(),
                ));
            }
        }
    }

    Ok(bounds)
}

// GET /api/professionals
pub async fn list_professionals(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProfessionalResponse>>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let pros = {
        let db = state.db.lock().unwrap();
        queries::get_professionals(&db, &tenant.id)?
    };

    Ok(Json(pros.into_iter().map(Into::into).collect()))
}

// POST /api/professionals
pub async fn create_professional(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ProfessionalPayload>,
) -> Result<Json<ProfessionalResponse>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "professional name must not be empty".into(),
        ));
    }
    let bounds = parse_schedule(&payload)?;

    let now = Utc::now().naive_utc();
    let pro = Professional {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant.id,
        name: payload.name.trim().to_string(),
        work_start_time: bounds.work_start,
        work_end_time: bounds.work_end,
        lunch_start_time: bounds.lunch_start,
        lunch_end_time: bounds.lunch_end,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_professional(&db, &pro)?;
    }

    Ok(Json(pro.into()))
}

// PUT /api/professionals/:id
pub async fn update_professional(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<ProfessionalPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;
    let bounds = parse_schedule(&payload)?;

    let now = Utc::now().naive_utc();
    let pro = Professional {
        id: id.clone(),
        tenant_id: tenant.id,
        name: payload.name,
        work_start_time: bounds.work_start,
        work_end_time: bounds.work_end,
        lunch_start_time: bounds.lunch_start,
        lunch_end_time: bounds.lunch_end,
        created_at: now,
        updated_at: now,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_professional(&db, &pro)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("professional {id}")));
    }
    Ok(Json(serde_json::json!({ "updated": true })))
}

// DELETE /api/professionals/:id
pub async fn delete_professional(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_professional(&db, &tenant.id, &id)?
    };

    if !deleted {
        return Err(AppError::NotFound(format!("professional {id}")));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
