use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use bursar_models::ids::{PaymentIntentId, StudentFeeId};

/// HTTP-facing application error: a status code plus a reportable cause.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn unauthorized(message: String) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message))
    }

    pub fn forbidden(message: String) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message))
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::database(err)
    }
}

/// Error body shape for API documentation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures of the payment lifecycle with defined caller-facing semantics.
///
/// Everything else (connection loss, serialization) stays a generic 500 so
/// the gateway retries.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Requested amount is non-positive or exceeds what is still payable.
    #[error("invalid payment amount: {reason}")]
    InvalidAmount { reason: String },

    /// Callback referenced an intent this service never issued.
    #[error("no payment intent found for reference {0}")]
    IntentNotFound(String),

    /// Callback signature did not verify against the shared secret.
    #[error("callback signature verification failed")]
    SignatureInvalid,

    /// A payment record already exists for this intent.
    #[error("payment already applied for intent {0}")]
    AlreadyApplied(PaymentIntentId),

    /// The ledger rows for a fee do not add up; the transaction is aborted
    /// and operators must investigate before any further crediting.
    #[error("fee ledger inconsistent for student fee {student_fee_id}: {detail}")]
    AllocationInconsistent {
        student_fee_id: StudentFeeId,
        detail: String,
    },
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        let status = match &err {
            PaymentError::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
            PaymentError::IntentNotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::SignatureInvalid => StatusCode::UNAUTHORIZED,
            PaymentError::AlreadyApplied(_) => StatusCode::CONFLICT,
            PaymentError::AllocationInconsistent { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, anyhow::Error::from(err))
    }
}
