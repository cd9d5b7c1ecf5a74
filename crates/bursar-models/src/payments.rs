//! Payment intent and payment record entities and DTOs.
//!
//! A [`PaymentIntent`] represents one attempt to pay toward a student fee
//! through the external gateway. It is created `pending` and finalized
//! exactly once to `confirmed` or `failed`; it never re-enters `pending`.
//! A [`FeePayment`] row exists only for confirmed intents, at most one per
//! intent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::ids::{FeePaymentId, PaymentIntentId, StudentFeeId};

/// Terminality: `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "intent_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntentState {
    Pending,
    Confirmed,
    Failed,
}

impl IntentState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, IntentState::Pending)
    }
}

/// One attempt to pay toward a student fee via the gateway.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    /// Unique reference handed to the gateway; callbacks carry it back.
    pub reference: String,
    pub student_fee_id: StudentFeeId,
    pub amount_minor: i64,
    pub payer_email: Option<String>,
    pub state: IntentState,
    pub gateway_txn_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Money actually credited against a student fee. Immutable.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct FeePayment {
    pub id: FeePaymentId,
    pub intent_id: PaymentIntentId,
    pub student_fee_id: StudentFeeId,
    pub amount_minor: i64,
    pub gateway_txn_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateIntentDto {
    pub student_fee_id: StudentFeeId,
    #[validate(range(min = 1))]
    pub amount_minor: i64,
    /// Receipt destination; the gateway also asks for it on its pay page.
    #[validate(email)]
    pub payer_email: Option<String>,
}

/// Fixed acknowledgment returned for every processed or replayed callback.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallbackAck {
    pub reference: String,
    pub state: IntentState,
    /// True when the callback matched an already-terminal intent.
    pub replayed: bool,
}

/// Generate a fresh gateway reference for a new intent.
pub fn new_reference() -> String {
    format!("BR-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_non_terminal_state() {
        assert!(!IntentState::Pending.is_terminal());
        assert!(IntentState::Confirmed.is_terminal());
        assert!(IntentState::Failed.is_terminal());
    }

    #[test]
    fn references_are_unique_and_prefixed() {
        let a = new_reference();
        let b = new_reference();
        assert_ne!(a, b);
        assert!(a.starts_with("BR-"));
        assert_eq!(a.len(), 3 + 32);
    }

    #[test]
    fn intent_dto_rejects_non_positive_amounts() {
        let dto = CreateIntentDto {
            student_fee_id: StudentFeeId::new(),
            amount_minor: 0,
            payer_email: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn intent_dto_rejects_bad_email() {
        let dto = CreateIntentDto {
            student_fee_id: StudentFeeId::new(),
            amount_minor: 50_000,
            payer_email: Some("not-an-email".to_string()),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn intent_dto_accepts_valid_request() {
        let dto = CreateIntentDto {
            student_fee_id: StudentFeeId::new(),
            amount_minor: 50_000,
            payer_email: Some("student@example.edu".to_string()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn state_serialization_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&IntentState::Confirmed).unwrap(),
            r#""confirmed""#
        );
    }
}
