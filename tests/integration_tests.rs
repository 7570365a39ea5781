use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceExt;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::models::Tenant;
use salonbook::state::AppState;

// ── Helpers ──

const TENANT_TOKEN: &str = "test-tenant-token";

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-admin-token".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
    });

    // Seed the tenant the tests act as.
    {
        let db = state.db.lock().unwrap();
        let tenant = Tenant {
            id: "tenant-1".to_string(),
            name: "Studio One".to_string(),
            api_token: TENANT_TOKEN.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        salonbook::db::queries::create_tenant(&db, &tenant).unwrap();
    }

    state
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/tenants", post(handlers::tenants::create_tenant))
        .route("/api/clients", get(handlers::clients::list_clients))
        .route("/api/clients", post(handlers::clients::create_client))
        .route("/api/clients/:id", put(handlers::clients::update_client))
        .route("/api/clients/:id", delete(handlers::clients::delete_client))
        .route(
            "/api/professionals",
            get(handlers::professionals::list_professionals),
        )
        .route(
            "/api/professionals",
            post(handlers::professionals::create_professional),
        )
        .route(
            "/api/professionals/:id",
            put(handlers::professionals::update_professional),
        )
        .route(
            "/api/professionals/:id",
            delete(handlers::professionals::delete_professional),
        )
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/services", post(handlers::catalog::create_service))
        .route("/api/services/:id", put(handlers::catalog::update_service))
        .route(
            "/api/services/:id",
            delete(handlers::catalog::delete_service),
        )
        .route("/api/products", get(handlers::catalog::list_products))
        .route("/api/products", post(handlers::catalog::create_product))
        .route("/api/products/:id", put(handlers::catalog::update_product))
        .route(
            "/api/products/:id",
            delete(handlers::catalog::delete_product),
        )
        .route(
            "/api/appointments",
            get(handlers::appointments::list_appointments),
        )
        .route(
            "/api/appointments",
            post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id/cancel",
            post(handlers::appointments::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/complete",
            post(handlers::appointments::complete_appointment),
        )
        .route("/api/financials", get(handlers::financials::list_entries))
        .route("/api/financials", post(handlers::financials::create_entry))
        .route(
            "/api/availability",
            get(handlers::availability::get_availability),
        )
        .with_state(state)
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Creates a professional working 09:00-18:00 with a 12:00-13:00 lunch and
/// returns its id.
async fn seed_professional(state: &Arc<AppState>) -> String {
    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/professionals",
            TENANT_TOKEN,
            r#"{"name":"Dana","work_start_time":"09:00","work_end_time":"18:00","lunch_start_time":"12:00","lunch_end_time":"13:00"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn seed_client(state: &Arc<AppState>) -> String {
    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/clients",
            TENANT_TOKEN,
            r#"{"name":"Alice","phone":"+15551110000"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn seed_service(state: &Arc<AppState>, duration_minutes: i64) -> String {
    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/services",
            TENANT_TOKEN,
            &format!(
                r#"{{"name":"Haircut","duration_minutes":{duration_minutes},"price_cents":4500}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

// ── Auth ──

#[tokio::test]
async fn test_requires_auth() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(get_request("/api/clients", "wrong-token"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tenant_creation_requires_admin_token() {
    let state = test_state();

    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json("/api/tenants", TENANT_TOKEN, r#"{"name":"Nope"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let app = test_app(state);
    let res = app
        .oneshot(post_json(
            "/api/tenants",
            "test-admin-token",
            r#"{"name":"Studio Two"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["name"], "Studio Two");
    assert!(json["api_token"].as_str().unwrap().len() > 10);
}

#[tokio::test]
async fn test_tenant_isolation() {
    let state = test_state();

    // Tenant one creates a client.
    seed_client(&state).await;

    // A second tenant with its own token sees an empty list.
    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/tenants",
            "test-admin-token",
            r#"{"name":"Other Studio"}"#,
        ))
        .await
        .unwrap();
    let other_token = body_json(res).await["api_token"]
        .as_str()
        .unwrap()
        .to_string();

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/clients", &other_token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

// ── Clients CRUD ──

#[tokio::test]
async fn test_client_crud() {
    let state = test_state();
    let id = seed_client(&state).await;

    // List
    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request("/api/clients", TENANT_TOKEN))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Alice");

    // Update
    let app = test_app(state.clone());
    let res = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/clients/{id}"))
                .header("Authorization", format!("Bearer {TENANT_TOKEN}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"name":"Alice B","phone":"+15551110000","notes":"regular"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request("/api/clients", TENANT_TOKEN))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json[0]["name"], "Alice B");
    assert_eq!(json[0]["notes"], "regular");

    // Delete
    let app = test_app(state.clone());
    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/clients/{id}"))
                .header("Authorization", format!("Bearer {TENANT_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/clients", TENANT_TOKEN))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

// ── Professionals ──

#[tokio::test]
async fn test_professional_schedule_roundtrip() {
    let state = test_state();
    seed_professional(&state).await;

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/professionals", TENANT_TOKEN))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json[0]["name"], "Dana");
    assert_eq!(json[0]["work_start_time"], "09:00");
    assert_eq!(json[0]["lunch_end_time"], "13:00");
}

#[tokio::test]
async fn test_professional_invalid_time_rejected() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(post_json(
            "/api/professionals",
            TENANT_TOKEN,
            r#"{"name":"Bad","work_start_time":"25:00","work_end_time":"18:00"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_professional_inverted_hours_rejected() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(post_json(
            "/api/professionals",
            TENANT_TOKEN,
            r#"{"name":"Bad","work_start_time":"18:00","work_end_time":"09:00"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_professional_lunch_outside_hours_rejected() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(post_json(
            "/api/professionals",
            TENANT_TOKEN,
            r#"{"name":"Bad","work_start_time":"09:00","work_end_time":"18:00","lunch_start_time":"08:00","lunch_end_time":"09:30"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Appointments ──

#[tokio::test]
async fn test_appointment_outside_hours_rejected() {
    let state = test_state();
    let pro = seed_professional(&state).await;
    let client = seed_client(&state).await;
    let service = seed_service(&state, 60).await;

    let app = test_app(state);
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 20:00"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_appointment_during_lunch_rejected() {
    let state = test_state();
    let pro = seed_professional(&state).await;
    let client = seed_client(&state).await;
    let service = seed_service(&state, 60).await;

    let app = test_app(state);
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 12:30"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_appointment_conflict_rejected_back_to_back_allowed() {
    let state = test_state();
    let pro = seed_professional(&state).await;
    let client = seed_client(&state).await;
    let service = seed_service(&state, 60).await;

    // 14:00-15:00
    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 14:00"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Overlapping 14:30 is rejected
    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 14:30"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Back-to-back 15:00 is fine
    let app = test_app(state);
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 15:00"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_appointments_for_day() {
    let state = test_state();
    let pro = seed_professional(&state).await;
    let client = seed_client(&state).await;
    let service = seed_service(&state, 60).await;

    for start in ["2099-06-15 10:00", "2099-06-15 14:00", "2099-06-16 10:00"] {
        let app = test_app(state.clone());
        let res = app
            .oneshot(post_json(
                "/api/appointments",
                TENANT_TOKEN,
                &format!(
                    r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"{start}"}}"#
                ),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request(
            &format!("/api/appointments?date=2099-06-15&professional_id={pro}"),
            TENANT_TOKEN,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let day = json.as_array().unwrap();
    assert_eq!(day.len(), 2);
    assert_eq!(day[0]["start_time"], "2099-06-15 10:00:00");
    assert_eq!(day[1]["start_time"], "2099-06-15 14:00:00");
}

#[tokio::test]
async fn test_cancelled_appointment_frees_the_slot() {
    let state = test_state();
    let pro = seed_professional(&state).await;
    let client = seed_client(&state).await;
    let service = seed_service(&state, 60).await;

    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 14:00"}}"#
            ),
        ))
        .await
        .unwrap();
    let appt_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            &format!("/api/appointments/{appt_id}/cancel"),
            TENANT_TOKEN,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The 14:00 slot can be booked again.
    let app = test_app(state);
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 14:00"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_completion_records_income() {
    let state = test_state();
    let pro = seed_professional(&state).await;
    let client = seed_client(&state).await;
    let service = seed_service(&state, 60).await;

    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 10:00"}}"#
            ),
        ))
        .await
        .unwrap();
    let appt_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            &format!("/api/appointments/{appt_id}/complete"),
            TENANT_TOKEN,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let res = app
        .oneshot(get_request(
            "/api/financials?from=2099-06-01&to=2099-06-30",
            TENANT_TOKEN,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["entry_type"], "income");
    assert_eq!(json[0]["amount_cents"], 4500);
    assert_eq!(json[0]["appointment_id"], appt_id.as_str());
}

// ── Availability ──

#[tokio::test]
async fn test_availability_without_professional_is_empty() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(get_request(
            "/api/availability?date=2099-06-15&duration_minutes=30",
            TENANT_TOKEN,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_availability_unknown_professional() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(get_request(
            "/api/availability?professional_id=nope&date=2099-06-15&duration_minutes=30",
            TENANT_TOKEN,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_respects_lunch_and_bookings() {
    let state = test_state();
    let pro = seed_professional(&state).await;
    let client = seed_client(&state).await;
    let service = seed_service(&state, 60).await;

    // Existing booking 14:00-15:00.
    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/appointments",
            TENANT_TOKEN,
            &format!(
                r#"{{"professional_id":"{pro}","client_id":"{client}","service_id":"{service}","start_time":"2099-06-15 14:00"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // 30-minute slots for a date far in the future, so the past-time
    // filter does not interfere.
    let app = test_app(state);
    let res = app
        .oneshot(get_request(
            &format!("/api/availability?professional_id={pro}&date=2099-06-15&duration_minutes=30"),
            TENANT_TOKEN,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let labels: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();

    assert_eq!(labels.first(), Some(&"09:00"));
    assert!(labels.contains(&"11:30")); // ends exactly at lunch start
    assert!(!labels.contains(&"12:00"));
    assert!(!labels.contains(&"12:30"));
    assert!(labels.contains(&"13:00"));
    assert!(labels.contains(&"13:30")); // ends exactly at booking start
    assert!(!labels.contains(&"14:00"));
    assert!(!labels.contains(&"14:30"));
    assert!(labels.contains(&"15:00")); // starts exactly at booking end
    assert_eq!(labels.last(), Some(&"17:30"));
}

#[tokio::test]
async fn test_availability_closing_boundary() {
    let state = test_state();
    let pro = seed_professional(&state).await;

    let app = test_app(state);
    let res = app
        .oneshot(get_request(
            &format!("/api/availability?professional_id={pro}&date=2099-06-15&duration_minutes=60"),
            TENANT_TOKEN,
        ))
        .await
        .unwrap();
    let json = body_json(res).await;
    let labels: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();

    // 17:00 ends exactly at 18:00 closing and is bookable.
    assert_eq!(labels.last(), Some(&"17:00"));
}

#[tokio::test]
async fn test_availability_professional_without_hours_is_empty() {
    let state = test_state();

    let app = test_app(state.clone());
    let res = app
        .oneshot(post_json(
            "/api/professionals",
            TENANT_TOKEN,
            r#"{"name":"No Hours"}"#,
        ))
        .await
        .unwrap();
    let pro = body_json(res).await["id"].as_str().unwrap().to_string();

    let app = test_app(state);
    let res = app
        .oneshot(get_request(
            &format!("/api/availability?professional_id={pro}&date=2099-06-15&duration_minutes=30"),
            TENANT_TOKEN,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}
