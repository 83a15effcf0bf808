//! Rutas HTTP
//!
//! Ensambla el router completo del servicio con sus capas.

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::cors_middleware;
use crate::state::AppState;

pub mod damage_detection_routes;
pub mod inspection_routes;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn create_app_router(state: AppState) -> Router {
    let cors = cors_middleware(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/reservations", inspection_routes::create_inspection_router())
        .nest(
            "/api/damage-detections",
            damage_detection_routes::create_damage_detection_router(),
        )
        .nest(
            "/api/vehicles",
            damage_detection_routes::create_vehicle_detection_router(),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
