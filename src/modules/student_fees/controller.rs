use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use bursar_models::ids::StudentFeeId;
use bursar_models::payments::FeePayment;

use crate::middleware::auth::AuthUser;
use crate::modules::student_fees::model::{
    AssignStudentFeeDto, BalanceResponse, CreateConcessionDto, CreateFineDto, FeeConcession,
    FeeFine, StudentFeeResponse,
};
use crate::modules::student_fees::service::StudentFeeService;
use crate::state::AppState;
use crate::utils::errors::{AppError, ErrorResponse};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/student-fees",
    request_body = AssignStudentFeeDto,
    responses(
        (status = 201, description = "Fee assigned to student", body = StudentFeeResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Fee structure not found", body = ErrorResponse),
        (status = 422, description = "Schedule does not sum to the structure total", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Fees"
)]
#[instrument]
pub async fn assign_student_fee(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<AssignStudentFeeDto>,
) -> Result<(StatusCode, Json<StudentFeeResponse>), AppError> {
    if !auth_user.is_staff() {
        return Err(AppError::forbidden(
            "Only bursar staff can assign fees".to_string(),
        ));
    }

    let fee = StudentFeeService::assign_fee(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(fee)))
}

#[utoipa::path(
    get,
    path = "/api/student-fees/{id}",
    params(("id" = StudentFeeId, Path, description = "Student fee ID")),
    responses(
        (status = 200, description = "Student fee with ledger detail", body = StudentFeeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Fees"
)]
#[instrument]
pub async fn get_student_fee(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<StudentFeeId>,
) -> Result<Json<StudentFeeResponse>, AppError> {
    let fee = StudentFeeService::get_fee(&state.db, id).await?;
    Ok(Json(fee))
}

#[utoipa::path(
    get,
    path = "/api/student-fees/{id}/balance",
    params(("id" = StudentFeeId, Path, description = "Student fee ID")),
    responses(
        (status = 200, description = "Outstanding balance breakdown", body = BalanceResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Fees"
)]
#[instrument]
pub async fn get_balance(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<StudentFeeId>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = StudentFeeService::balance(&state.db, id).await?;
    Ok(Json(balance))
}

#[utoipa::path(
    post,
    path = "/api/student-fees/{id}/concessions",
    params(("id" = StudentFeeId, Path, description = "Student fee ID")),
    request_body = CreateConcessionDto,
    responses(
        (status = 201, description = "Concession recorded", body = FeeConcession),
        (status = 400, description = "Amount exceeds outstanding balance", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Fees"
)]
#[instrument]
pub async fn add_concession(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<StudentFeeId>,
    ValidatedJson(dto): ValidatedJson<CreateConcessionDto>,
) -> Result<(StatusCode, Json<FeeConcession>), AppError> {
    if !auth_user.is_staff() {
        return Err(AppError::forbidden(
            "Only bursar staff can approve concessions".to_string(),
        ));
    }

    let approved_by = auth_user.user_id()?;
    let concession = StudentFeeService::add_concession(&state.db, id, dto, approved_by).await?;
    Ok((StatusCode::CREATED, Json(concession)))
}

#[utoipa::path(
    post,
    path = "/api/student-fees/{id}/fines",
    params(("id" = StudentFeeId, Path, description = "Student fee ID")),
    request_body = CreateFineDto,
    responses(
        (status = 201, description = "Fine recorded", body = FeeFine),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Fees"
)]
#[instrument]
pub async fn add_fine(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<StudentFeeId>,
    ValidatedJson(dto): ValidatedJson<CreateFineDto>,
) -> Result<(StatusCode, Json<FeeFine>), AppError> {
    if !auth_user.is_staff() {
        return Err(AppError::forbidden(
            "Only bursar staff can impose fines".to_string(),
        ));
    }

    let imposed_by = auth_user.user_id()?;
    let fine = StudentFeeService::add_fine(&state.db, id, dto, imposed_by).await?;
    Ok((StatusCode::CREATED, Json(fine)))
}

#[utoipa::path(
    get,
    path = "/api/student-fees/{id}/payments",
    params(("id" = StudentFeeId, Path, description = "Student fee ID")),
    responses(
        (status = 200, description = "Confirmed payments", body = [FeePayment]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Fees"
)]
#[instrument]
pub async fn get_fee_payments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<StudentFeeId>,
) -> Result<Json<Vec<FeePayment>>, AppError> {
    let payments = StudentFeeService::list_payments(&state.db, id).await?;
    Ok(Json(payments))
}
