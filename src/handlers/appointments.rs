use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, EntryType, FinancialEntry};
use crate::services::scheduling::validate_appointment_time;
use crate::state::AppState;

fn parse_start_time(s: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| AppError::BadRequest(format!("invalid start_time: {s}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {s}")))
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    id: String,
    professional_id: String,
    client_id: String,
    service_id: String,
    start_time: String,
    end_time: String,
    status: String,
    notes: Option<String>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        AppointmentResponse {
            id: a.id,
            professional_id: a.professional_id,
            client_id: a.client_id,
            service_id: a.service_id,
            start_time: a.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            end_time: a.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            status: a.status.as_str().to_string(),
            notes: a.notes,
        }
    }
}

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub date: String,
    pub professional_id: Option<String>,
}

// GET /api/appointments?date=YYYY-MM-DD[&professional_id=...]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let tenant = authenticate(&state, &headers)?;
    let date = parse_date(&query.date)?;

    let appointments = {
        let db = state.db.lock().unwrap();
        queries::get_appointments_for_day(&db, &tenant.id, query.professional_id.as_deref(), date)?
    };

    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

#[derive(Deserialize)]
pub struct CreateAppointmentPayload {
    pub professional_id: String,
    pub client_id: String,
    pub service_id: String,
    pub start_time: String,
    pub notes: Option<String>,
}

// POST /api/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateAppointmentPayload>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let tenant = authenticate(&state, &headers)?;
    let start_time = parse_start_time(&payload.start_time)?;

    let appointment = {
        let db = state.db.lock().unwrap();

        let professional =
            queries::get_professional_by_id(&db, &tenant.id, &payload.professional_id)?
                .ok_or_else(|| {
                    AppError::NotFound(format!("professional {}", payload.professional_id))
                })?;
        let service = queries::get_service_by_id(&db, &tenant.id, &payload.service_id)?
            .ok_or_else(|| AppError::NotFound(format!("service {}", payload.service_id)))?;

        let booked =
            queries::booked_intervals_on(&db, &tenant.id, &professional.id, start_time.date())?;

        validate_appointment_time(
            &professional.schedule(),
            start_time,
            service.duration_minutes,
            &booked,
        )
        .map_err(|e| AppError::Scheduling(e.to_string()))?;

        let now = Utc::now().naive_utc();
        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant.id.clone(),
            professional_id: professional.id,
            client_id: payload.client_id,
            service_id: service.id,
            start_time,
            end_time: start_time + Duration::minutes(service.duration_minutes),
            status: AppointmentStatus::Scheduled,
            notes: payload.notes,
            created_at: now,
            updated_at: now,
        };
        queries::create_appointment(&db, &appointment)?;
        appointment
    };

    tracing::info!(
        appointment_id = %appointment.id,
        professional_id = %appointment.professional_id,
        "scheduled appointment"
    );

    Ok(Json(appointment.into()))
}

// POST /api/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_appointment_status(&db, &tenant.id, &id, &AppointmentStatus::Cancelled)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("appointment {id}")));
    }
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

// POST /api/appointments/:id/complete
//
// Completion also records the service price as an income entry, so the
// financial ledger tracks delivered work without a separate manual step.
pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    {
        let db = state.db.lock().unwrap();

        let appointment = queries::get_appointment_by_id(&db, &tenant.id, &id)?
            .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(AppError::BadRequest(
                "cannot complete a cancelled appointment".into(),
            ));
        }

        let service = queries::get_service_by_id(&db, &tenant.id, &appointment.service_id)?;

        queries::update_appointment_status(&db, &tenant.id, &id, &AppointmentStatus::Completed)?;

        if let Some(service) = service {
            let entry = FinancialEntry {
                id: Uuid::new_v4().to_string(),
                tenant_id: tenant.id.clone(),
                entry_type: EntryType::Income,
                description: service.name,
                amount_cents: service.price_cents,
                entry_date: appointment.start_time.date(),
                appointment_id: Some(appointment.id),
                created_at: Utc::now().naive_utc(),
            };
            queries::create_financial_entry(&db, &entry)?;
        }
    }

    Ok(Json(serde_json::json!({ "completed": true })))
}
