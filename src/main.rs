use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = Router::new()
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
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
