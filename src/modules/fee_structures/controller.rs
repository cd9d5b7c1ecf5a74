use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use tracing::instrument;

use bursar_models::ids::FeeStructureId;

use crate::modules::fee_structures::model::{
    CreateFeeStructureDto, FeeStructureFilter, FeeStructureResponse,
    PaginatedFeeStructuresResponse, UpdateFeeStructureDto,
};
use crate::modules::fee_structures::service::FeeStructureService;
use crate::state::AppState;
use crate::utils::errors::{AppError, ErrorResponse};
use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/fee-structures",
    request_body = CreateFeeStructureDto,
    responses(
        (status = 201, description = "Fee structure created", body = FeeStructureResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fee Structures"
)]
#[instrument]
pub async fn create_fee_structure(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateFeeStructureDto>,
) -> Result<(StatusCode, Json<FeeStructureResponse>), AppError> {
    let structure = FeeStructureService::create_structure(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(structure)))
}

#[utoipa::path(
    get,
    path = "/api/fee-structures",
    params(FeeStructureFilter, PaginationParams),
    responses(
        (status = 200, description = "Fee structures", body = PaginatedFeeStructuresResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fee Structures"
)]
#[instrument]
pub async fn get_fee_structures(
    State(state): State<AppState>,
    Query(filter): Query<FeeStructureFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedFeeStructuresResponse>, AppError> {
    let (data, total) =
        FeeStructureService::list_structures(&state.db, &filter, &pagination).await?;

    Ok(Json(PaginatedFeeStructuresResponse {
        data,
        meta: PaginationMeta::new(total, &pagination),
    }))
}

#[utoipa::path(
    get,
    path = "/api/fee-structures/{id}",
    params(("id" = FeeStructureId, Path, description = "Fee structure ID")),
    responses(
        (status = 200, description = "Fee structure detail", body = FeeStructureResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fee Structures"
)]
#[instrument]
pub async fn get_fee_structure(
    State(state): State<AppState>,
    Path(id): Path<FeeStructureId>,
) -> Result<Json<FeeStructureResponse>, AppError> {
    let structure = FeeStructureService::get_structure(&state.db, id).await?;
    Ok(Json(structure))
}

#[utoipa::path(
    put,
    path = "/api/fee-structures/{id}",
    params(("id" = FeeStructureId, Path, description = "Fee structure ID")),
    request_body = UpdateFeeStructureDto,
    responses(
        (status = 200, description = "Fee structure updated", body = FeeStructureResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Structure already assigned", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fee Structures"
)]
#[instrument]
pub async fn update_fee_structure(
    State(state): State<AppState>,
    Path(id): Path<FeeStructureId>,
    ValidatedJson(dto): ValidatedJson<UpdateFeeStructureDto>,
) -> Result<Json<FeeStructureResponse>, AppError> {
    let structure = FeeStructureService::update_structure(&state.db, id, dto).await?;
    Ok(Json(structure))
}

#[utoipa::path(
    delete,
    path = "/api/fee-structures/{id}",
    params(("id" = FeeStructureId, Path, description = "Fee structure ID")),
    responses(
        (status = 200, description = "Fee structure deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Structure already assigned", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fee Structures"
)]
#[instrument]
pub async fn delete_fee_structure(
    State(state): State<AppState>,
    Path(id): Path<FeeStructureId>,
) -> Result<Json<serde_json::Value>, AppError> {
    FeeStructureService::delete_structure(&state.db, id).await?;
    Ok(Json(json!({"message": "Fee structure deleted successfully"})))
}
