use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info, instrument, warn};

use bursar_gateway::GatewayConfig;
use bursar_models::ids::StudentFeeId;

use crate::metrics;
use crate::modules::payments::allocation::{self, FineSlice, InstallmentSlice};
use crate::modules::payments::model::{
    CallbackAck, CallbackOutcome, CallbackPayload, CreateIntentDto, FeePayment, GatewayStatus,
    IntentCreatedResponse, IntentState, PaymentIntent, PaymentReceipt, RedirectParams,
    new_reference,
};
use crate::modules::student_fees::service::StudentFeeService;
use crate::utils::errors::{AppError, PaymentError};

const INTENT_COLS: &str = "id, reference, student_fee_id, amount_minor, payer_email, state, \
     gateway_txn_id, gateway_signature, failure_reason, created_at, settled_at";
const PAYMENT_COLS: &str = "id, intent_id, student_fee_id, amount_minor, gateway_txn_id, created_at";

/// Creates and tracks payment intents. The only writer of PENDING rows;
/// terminal transitions belong to [`ReconcileService`].
pub struct IntentService;

impl IntentService {
    /// Open a PENDING intent for part of a student fee's outstanding
    /// balance and hand back the signed gateway redirect.
    ///
    /// Runs inside one transaction with the fee row locked, so two clients
    /// (or a racing callback) cannot over-commit the same balance. Other
    /// still-PENDING intents count against the payable amount.
    #[instrument(skip(db, gateway, dto))]
    pub async fn create_intent(
        db: &PgPool,
        gateway: &GatewayConfig,
        dto: CreateIntentDto,
    ) -> Result<IntentCreatedResponse, AppError> {
        let mut tx = db.begin().await?;

        let fee_locked: Option<StudentFeeId> =
            sqlx::query_scalar("SELECT id FROM student_fees WHERE id = $1 FOR UPDATE")
                .bind(dto.student_fee_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock student fee")
                .map_err(AppError::database)?;

        if fee_locked.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Student fee not found")));
        }

        if dto.amount_minor <= 0 {
            return Err(PaymentError::InvalidAmount {
                reason: format!("amount must be positive, got {}", dto.amount_minor),
            }
            .into());
        }

        let balance = StudentFeeService::balance_with(&mut *tx, dto.student_fee_id).await?;

        let pending_minor: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_minor), 0)::BIGINT
             FROM payment_intents
             WHERE student_fee_id = $1 AND state = 'pending'",
        )
        .bind(dto.student_fee_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to sum pending intents")
        .map_err(AppError::database)?;

        let payable_minor = balance.outstanding_minor - pending_minor;
        if dto.amount_minor > payable_minor {
            return Err(PaymentError::InvalidAmount {
                reason: format!(
                    "amount {} exceeds payable balance {} ({} outstanding, {} already pending)",
                    dto.amount_minor, payable_minor, balance.outstanding_minor, pending_minor
                ),
            }
            .into());
        }

        let reference = new_reference();
        let intent = sqlx::query_as::<_, PaymentIntent>(&format!(
            "INSERT INTO payment_intents (reference, student_fee_id, amount_minor, payer_email)
             VALUES ($1, $2, $3, $4)
             RETURNING {INTENT_COLS}"
        ))
        .bind(&reference)
        .bind(dto.student_fee_id)
        .bind(dto.amount_minor)
        .bind(&dto.payer_email)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert payment intent")
        .map_err(AppError::database)?;

        tx.commit().await?;

        metrics::track_intent_created();
        info!(
            reference = %intent.reference,
            student_fee_id = %intent.student_fee_id,
            amount_minor = intent.amount_minor,
            "Payment intent created"
        );

        let redirect = RedirectParams::build(gateway, &intent.reference, intent.amount_minor);
        Ok(IntentCreatedResponse {
            reference: intent.reference,
            state: intent.state,
            amount_minor: intent.amount_minor,
            redirect,
        })
    }

    /// Status poll by gateway reference.
    #[instrument(skip(db))]
    pub async fn get_by_reference(
        db: &PgPool,
        reference: &str,
    ) -> Result<PaymentIntent, AppError> {
        sqlx::query_as::<_, PaymentIntent>(&format!(
            "SELECT {INTENT_COLS} FROM payment_intents WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(db)
        .await
        .context("Failed to fetch payment intent")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::from(PaymentError::IntentNotFound(reference.to_string())))
    }

    /// Out-of-band sweep: fail PENDING intents older than the callback
    /// window and flip past-due pending installments to overdue. Intents a
    /// concurrent callback is finalizing are skipped via the row lock plus
    /// the state predicate.
    #[instrument(skip(db))]
    pub async fn expire_stale(db: &PgPool, older_than_minutes: i32) -> Result<(u64, u64), AppError> {
        let expired = sqlx::query(
            "UPDATE payment_intents
             SET state = 'failed', failure_reason = 'expired', settled_at = now()
             WHERE state = 'pending'
               AND created_at < now() - make_interval(mins => $1)",
        )
        .bind(older_than_minutes)
        .execute(db)
        .await
        .context("Failed to expire stale intents")
        .map_err(AppError::database)?
        .rows_affected();

        let overdue = sqlx::query(
            "UPDATE student_fee_installments
             SET status = 'overdue', updated_at = now()
             WHERE status = 'pending' AND due_date < CURRENT_DATE",
        )
        .execute(db)
        .await
        .context("Failed to mark overdue installments")
        .map_err(AppError::database)?
        .rows_affected();

        info!(expired, overdue, "Expiry sweep completed");
        Ok((expired, overdue))
    }
}

/// Finalizes intents from gateway callbacks, exactly once per reference.
pub struct ReconcileService;

impl ReconcileService {
    /// Verify, reconcile and (on success) apply a gateway callback.
    ///
    /// The intent row is locked `FOR UPDATE` across the read-check-transition
    /// sequence, so two concurrent callbacks for one reference serialize:
    /// the first finalizes, the second sees a terminal state and replays the
    /// recorded outcome. The ledger update commits in the same transaction
    /// as the state transition.
    #[instrument(skip(db, gateway, payload), fields(reference = %payload.reference))]
    pub async fn handle_callback(
        db: &PgPool,
        gateway: &GatewayConfig,
        payload: CallbackPayload,
    ) -> Result<CallbackOutcome, AppError> {
        payload
            .validate_fields()
            .map_err(|e| AppError::bad_request(anyhow::anyhow!(e)))?;

        if payload.verify_signature(&gateway.secret).is_err() {
            metrics::track_signature_rejected();
            warn!(
                reference = %payload.reference,
                gateway_txn_id = %payload.gateway_txn_id,
                "Rejected gateway callback with invalid signature"
            );
            return Err(PaymentError::SignatureInvalid.into());
        }

        let mut tx = db.begin().await?;

        let intent = sqlx::query_as::<_, PaymentIntent>(&format!(
            "SELECT {INTENT_COLS} FROM payment_intents WHERE reference = $1 FOR UPDATE"
        ))
        .bind(&payload.reference)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to load payment intent")
        .map_err(AppError::database)?;

        let Some(intent) = intent else {
            return Err(PaymentError::IntentNotFound(payload.reference.clone()).into());
        };

        if intent.state.is_terminal() {
            tx.rollback().await?;
            metrics::track_callback_replayed();
            info!(
                reference = %intent.reference,
                state = ?intent.state,
                "Duplicate gateway callback, replaying recorded outcome"
            );
            return Ok(CallbackOutcome {
                ack: CallbackAck {
                    reference: intent.reference,
                    state: intent.state,
                    replayed: true,
                },
                receipt: None,
            });
        }

        let (new_state, failure_reason) = match payload.status {
            GatewayStatus::Success if payload.amount_minor == intent.amount_minor => {
                (IntentState::Confirmed, None)
            }
            GatewayStatus::Success => (
                IntentState::Failed,
                Some(format!(
                    "amount mismatch: gateway reported {}, intent holds {}",
                    payload.amount_minor, intent.amount_minor
                )),
            ),
            GatewayStatus::Failure => {
                (IntentState::Failed, Some("gateway reported failure".to_string()))
            }
        };

        sqlx::query(
            "UPDATE payment_intents
             SET state = $1, gateway_txn_id = $2, gateway_signature = $3,
                 failure_reason = $4, settled_at = now()
             WHERE id = $5",
        )
        .bind(new_state)
        .bind(&payload.gateway_txn_id)
        .bind(&payload.signature)
        .bind(&failure_reason)
        .bind(intent.id)
        .execute(&mut *tx)
        .await
        .context("Failed to finalize payment intent")
        .map_err(AppError::database)?;

        let receipt = if new_state == IntentState::Confirmed {
            LedgerService::apply_payment(&mut *tx, &intent, &payload.gateway_txn_id).await?;
            intent.payer_email.clone().map(|email| PaymentReceipt {
                email,
                reference: intent.reference.clone(),
                amount_minor: intent.amount_minor,
                gateway_txn_id: payload.gateway_txn_id.clone(),
            })
        } else {
            None
        };

        tx.commit().await?;

        match new_state {
            IntentState::Confirmed => {
                metrics::track_payment_confirmed(intent.amount_minor);
                info!(
                    reference = %intent.reference,
                    gateway_txn_id = %payload.gateway_txn_id,
                    amount_minor = intent.amount_minor,
                    "Payment confirmed and applied"
                );
            }
            _ => {
                metrics::track_payment_failed();
                warn!(
                    reference = %intent.reference,
                    gateway_txn_id = %payload.gateway_txn_id,
                    reason = failure_reason.as_deref().unwrap_or("unknown"),
                    "Payment intent failed"
                );
            }
        }

        Ok(CallbackOutcome {
            ack: CallbackAck {
                reference: intent.reference.clone(),
                state: new_state,
                replayed: false,
            },
            receipt,
        })
    }
}

/// Applies confirmed intents to the fee ledger.
pub struct LedgerService;

impl LedgerService {
    /// Allocate a confirmed intent across the fee's ledger rows and record
    /// the payment. Must run inside the reconciler's transaction: either
    /// every installment update and the FeePayment insert commit together
    /// with the intent transition, or none do.
    pub(crate) async fn apply_payment(
        conn: &mut PgConnection,
        intent: &PaymentIntent,
        gateway_txn_id: &str,
    ) -> Result<FeePayment, AppError> {
        // The reconciler's replay check should make this unreachable.
        let already_applied: Option<bursar_models::ids::FeePaymentId> =
            sqlx::query_scalar("SELECT id FROM fee_payments WHERE intent_id = $1")
                .bind(intent.id)
                .fetch_optional(&mut *conn)
                .await
                .context("Failed to check for existing payment")
                .map_err(AppError::database)?;

        if already_applied.is_some() {
            return Err(PaymentError::AlreadyApplied(intent.id).into());
        }

        // Per-fee serialization: concurrent payments for the same fee must
        // not both read the same earliest unpaid installment.
        let total_minor: i64 = sqlx::query_scalar(
            "SELECT total_minor FROM student_fees WHERE id = $1 FOR UPDATE",
        )
        .bind(intent.student_fee_id)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to lock student fee")
        .map_err(AppError::database)?;

        let installments: Vec<InstallmentSlice> = sqlx::query_as(
            "SELECT id, amount_minor, paid_minor
             FROM student_fee_installments
             WHERE student_fee_id = $1
             ORDER BY due_date, created_at
             FOR UPDATE",
        )
        .bind(intent.student_fee_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to lock installments")
        .map_err(AppError::database)?;

        let scheduled_minor: i64 = installments.iter().map(|i| i.amount_minor).sum();
        if scheduled_minor != total_minor {
            return Err(Self::inconsistent(
                intent.student_fee_id,
                format!(
                    "installments sum to {} but the fee totals {}",
                    scheduled_minor, total_minor
                ),
            ));
        }

        let fines: Vec<FineSlice> = sqlx::query_as(
            "SELECT id, amount_minor, paid_minor
             FROM fee_fines
             WHERE student_fee_id = $1 AND status = 'pending'
             ORDER BY created_at
             FOR UPDATE",
        )
        .bind(intent.student_fee_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to lock fines")
        .map_err(AppError::database)?;

        let plan = allocation::plan(&installments, &fines, intent.amount_minor);
        if plan.leftover_minor > 0 {
            return Err(Self::inconsistent(
                intent.student_fee_id,
                format!(
                    "{} of intent {} could not be allocated",
                    plan.leftover_minor, intent.reference
                ),
            ));
        }

        for update in &plan.installments {
            sqlx::query(
                "UPDATE student_fee_installments
                 SET paid_minor = $1, status = $2, updated_at = now()
                 WHERE id = $3",
            )
            .bind(update.new_paid_minor)
            .bind(update.new_status)
            .bind(update.id)
            .execute(&mut *conn)
            .await
            .context("Failed to update installment")
            .map_err(AppError::database)?;
        }

        for update in &plan.fines {
            sqlx::query("UPDATE fee_fines SET paid_minor = $1, status = $2 WHERE id = $3")
                .bind(update.new_paid_minor)
                .bind(update.new_status)
                .bind(update.id)
                .execute(&mut *conn)
                .await
                .context("Failed to update fine")
                .map_err(AppError::database)?;
        }

        let payment = sqlx::query_as::<_, FeePayment>(&format!(
            "INSERT INTO fee_payments (intent_id, student_fee_id, amount_minor, gateway_txn_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {PAYMENT_COLS}"
        ))
        .bind(intent.id)
        .bind(intent.student_fee_id)
        .bind(intent.amount_minor)
        .bind(gateway_txn_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::from(PaymentError::AlreadyApplied(intent.id));
                }
            }
            AppError::database(e)
        })?;

        info!(
            payment_id = %payment.id,
            reference = %intent.reference,
            student_fee_id = %intent.student_fee_id,
            amount_minor = payment.amount_minor,
            installments_touched = plan.installments.len(),
            fines_touched = plan.fines.len(),
            "Payment applied to ledger"
        );

        Ok(payment)
    }

    fn inconsistent(student_fee_id: StudentFeeId, detail: String) -> AppError {
        // Operator alert: the ledger itself is wrong, not the request.
        error!(
            student_fee_id = %student_fee_id,
            detail = %detail,
            "LEDGER INCONSISTENCY detected, aborting payment application"
        );
        PaymentError::AllocationInconsistent {
            student_fee_id,
            detail,
        }
        .into()
    }
}
