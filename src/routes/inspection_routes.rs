use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{
    ApiResponse, CompleteInspectionRequest, DamageCompareResponse, InspectionResponse,
    SaveDraftRequest,
};
use crate::middleware::TenantContext;
use crate::models::{InspectionType, InspectionWarning};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_inspection_router() -> Router<AppState> {
    Router::new()
        .route(
            "/:reservation_id/inspections/:inspection_type",
            get(get_inspection),
        )
        .route(
            "/:reservation_id/inspections/:inspection_type/draft",
            put(save_draft),
        )
        .route(
            "/:reservation_id/inspections/:inspection_type/complete",
            post(complete_inspection),
        )
        .route("/:reservation_id/warnings", get(list_warnings))
        .route("/:reservation_id/damage-compare", get(damage_compare))
}

async fn save_draft(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path((reservation_id, inspection_type)): Path<(Uuid, InspectionType)>,
    Json(request): Json<SaveDraftRequest>,
) -> Result<Json<ApiResponse<InspectionResponse>>, AppError> {
    request.validate()?;
    let response = state
        .inspections
        .save_draft(tenant.tenant_id, reservation_id, inspection_type, tenant.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn complete_inspection(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path((reservation_id, inspection_type)): Path<(Uuid, InspectionType)>,
    Json(request): Json<CompleteInspectionRequest>,
) -> Result<Json<ApiResponse<InspectionResponse>>, AppError> {
    request.validate()?;
    let response = state
        .inspections
        .complete(tenant.tenant_id, reservation_id, inspection_type, tenant.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        response,
        format!("{} inspection completed", inspection_type),
    )))
}

async fn get_inspection(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path((reservation_id, inspection_type)): Path<(Uuid, InspectionType)>,
) -> Result<Json<ApiResponse<InspectionResponse>>, AppError> {
    let response = state
        .inspections
        .get_inspection(tenant.tenant_id, reservation_id, inspection_type)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn list_warnings(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<InspectionWarning>>>, AppError> {
    let warnings = state
        .inspections
        .list_warnings(tenant.tenant_id, reservation_id)
        .await?;
    Ok(Json(ApiResponse::success(warnings)))
}

async fn damage_compare(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DamageCompareResponse>>, AppError> {
    let response = state
        .inspections
        .damage_compare(tenant.tenant_id, reservation_id)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}
