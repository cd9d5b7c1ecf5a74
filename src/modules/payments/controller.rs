use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{instrument, warn};

use crate::middleware::auth::AuthUser;
use crate::modules::payments::model::{
    CallbackAck, CallbackPayload, CreateIntentDto, IntentCreatedResponse, PaymentIntent,
};
use crate::modules::payments::service::{IntentService, ReconcileService};
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::errors::{AppError, ErrorResponse};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/payments/intents",
    request_body = CreateIntentDto,
    responses(
        (status = 201, description = "Intent created, redirect parameters returned", body = IntentCreatedResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student fee not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument]
pub async fn create_intent(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateIntentDto>,
) -> Result<(StatusCode, Json<IntentCreatedResponse>), AppError> {
    let intent = IntentService::create_intent(&state.db, &state.gateway_config, dto).await?;
    Ok((StatusCode::CREATED, Json(intent)))
}

#[utoipa::path(
    get,
    path = "/api/payments/intents/{reference}",
    params(("reference" = String, Path, description = "Gateway reference of the intent")),
    responses(
        (status = 200, description = "Intent status", body = PaymentIntent),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Unknown reference", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument]
pub async fn get_intent(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(reference): Path<String>,
) -> Result<Json<PaymentIntent>, AppError> {
    let intent = IntentService::get_by_reference(&state.db, &reference).await?;
    Ok(Json(intent))
}

/// Gateway webhook. Unauthenticated: authenticity comes from the HMAC
/// signature inside the payload. Replays of settled references return the
/// recorded outcome with 200 so the gateway stops retrying.
#[utoipa::path(
    post,
    path = "/api/payments/callback",
    request_body = CallbackPayload,
    responses(
        (status = 200, description = "Callback processed or replayed", body = CallbackAck),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Signature verification failed", body = ErrorResponse),
        (status = 404, description = "Unknown reference", body = ErrorResponse)
    ),
    tag = "Payments"
)]
#[instrument]
pub async fn gateway_callback(
    State(state): State<AppState>,
    Json(payload): Json<CallbackPayload>,
) -> Result<Json<CallbackAck>, AppError> {
    let outcome =
        ReconcileService::handle_callback(&state.db, &state.gateway_config, payload).await?;

    // Receipt delivery is a courtesy; the payment is already committed.
    if let Some(receipt) = outcome.receipt {
        let email_config = state.email_config.clone();
        tokio::spawn(async move {
            let mailer = EmailService::new(email_config);
            if let Err(e) = mailer
                .send_payment_receipt(
                    &receipt.email,
                    &receipt.reference,
                    receipt.amount_minor,
                    &receipt.gateway_txn_id,
                )
                .await
            {
                warn!(
                    reference = %receipt.reference,
                    error = %e.error,
                    "Failed to send payment receipt"
                );
            }
        });
    }

    Ok(Json(outcome.ack))
}
