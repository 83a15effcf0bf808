use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{ApiResponse, ProcessDetectionRequest, VerifyDetectionRequest};
use crate::middleware::TenantContext;
use crate::models::DamageDetection;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_damage_detection_router() -> Router<AppState> {
    Router::new()
        .route("/", post(process_detection))
        .route("/:id", get(get_detection))
        .route("/:id/verify", post(verify_detection))
}

pub fn create_vehicle_detection_router() -> Router<AppState> {
    Router::new().route("/:vehicle_id/damage-detections", get(list_vehicle_detections))
}

async fn process_detection(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<ProcessDetectionRequest>,
) -> Result<Json<ApiResponse<DamageDetection>>, AppError> {
    request.validate()?;
    let detection = state.detections.process(tenant.tenant_id, request).await?;
    Ok(Json(ApiResponse::success(detection)))
}

async fn get_detection(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DamageDetection>>, AppError> {
    let detection = state.detections.get(tenant.tenant_id, id).await?;
    Ok(Json(ApiResponse::success(detection)))
}

async fn verify_detection(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(request): Json<VerifyDetectionRequest>,
) -> Result<Json<ApiResponse<DamageDetection>>, AppError> {
    request.validate()?;
    let detection = state
        .detections
        .verify(tenant.tenant_id, id, tenant.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success_with_message(detection, "Detection verified")))
}

async fn list_vehicle_detections(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<DamageDetection>>>, AppError> {
    let detections = state
        .detections
        .list_for_vehicle(tenant.tenant_id, vehicle_id)
        .await?;
    Ok(Json(ApiResponse::success(detections)))
}
