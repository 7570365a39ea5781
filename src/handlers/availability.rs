use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::authenticate;
use crate::db::queries;
use crate::errors::AppError;
use crate::services::slot_feed::{FeedKey, FeedState, SlotFeed, SqliteBookingSource};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub professional_id: Option<String>,
    pub date: String,
    pub duration_minutes: i64,
}

#[derive(Serialize)]
pub struct SlotResponse {
    label: String,
    start: String,
}

// GET /api/availability?professional_id=...&date=YYYY-MM-DD&duration_minutes=N
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let tenant = authenticate(&state, &headers)?;

    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {}", query.date)))?;
    if query.duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "duration_minutes must be positive".into(),
        ));
    }

    // No professional selected: the bookings query is never issued and the
    // result is an empty, non-error slot list.
    let Some(professional_id) = query.professional_id else {
        return Ok(Json(vec![]));
    };

    let professional = {
        let db = state.db.lock().unwrap();
        queries::get_professional_by_id(&db, &tenant.id, &professional_id)?
            .ok_or_else(|| AppError::NotFound(format!("professional {professional_id}")))?
    };

    let source = SqliteBookingSource::new(Arc::clone(&state.db), tenant.id.clone());
    let feed = SlotFeed::new();
    feed.refresh(
        &source,
        FeedKey {
            professional_id: Some(professional.id.clone()),
            schedule: Some(professional.schedule()),
            date,
            duration_minutes: query.duration_minutes,
        },
        Utc::now().naive_utc(),
    )
    .await;

    match feed.snapshot() {
        FeedState::Ready(slots) => Ok(Json(
            slots
                .into_iter()
                .map(|s| SlotResponse {
                    label: s.label,
                    start: s.start.format("%Y-%m-%d %H:%M:%S").to_string(),
                })
                .collect(),
        )),
        FeedState::Failed(msg) => Err(AppError::BookingsSource(msg)),
        FeedState::Disabled | FeedState::Loading => Ok(Json(vec![])),
    }
}
