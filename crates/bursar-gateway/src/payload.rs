//! Typed gateway callback payload.
//!
//! The gateway posts JSON with a transaction id, our reference, a status and
//! the amount it processed, plus an HMAC signature over those fields. The
//! payload is validated field by field before the signature is checked, so a
//! structurally broken request never reaches the crypto path.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::signature::{self, SignatureMismatch};

/// Outcome the gateway reports for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Success,
    Failure,
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayStatus::Success => f.write_str("success"),
            GatewayStatus::Failure => f.write_str("failure"),
        }
    }
}

/// A structurally invalid callback payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadFieldError {
    #[error("callback field `{0}` is empty")]
    EmptyField(&'static str),
    #[error("callback amount must be positive, got {0}")]
    NonPositiveAmount(i64),
}

/// Callback body posted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallbackPayload {
    /// Our intent reference, echoed back by the gateway.
    pub reference: String,
    /// The gateway's own transaction id.
    pub gateway_txn_id: String,
    pub status: GatewayStatus,
    /// Amount the gateway processed, in minor units.
    pub amount_minor: i64,
    /// Hex HMAC-SHA256 over the canonical string.
    pub signature: String,
}

impl CallbackPayload {
    /// Check each field before any signature work.
    pub fn validate_fields(&self) -> Result<(), PayloadFieldError> {
        if self.reference.trim().is_empty() {
            return Err(PayloadFieldError::EmptyField("reference"));
        }
        if self.gateway_txn_id.trim().is_empty() {
            return Err(PayloadFieldError::EmptyField("gateway_txn_id"));
        }
        if self.signature.trim().is_empty() {
            return Err(PayloadFieldError::EmptyField("signature"));
        }
        if self.amount_minor <= 0 {
            return Err(PayloadFieldError::NonPositiveAmount(self.amount_minor));
        }
        Ok(())
    }

    /// Fixed-order canonical string the signature covers.
    pub fn canonical_string(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.amount_minor, self.gateway_txn_id, self.reference, self.status
        )
    }

    /// Verify the embedded signature with the shared secret.
    pub fn verify_signature(&self, secret: &str) -> Result<(), SignatureMismatch> {
        signature::verify(secret, &self.canonical_string(), &self.signature)
    }

    /// Build a correctly signed payload. Exercised by tests and useful for
    /// sandbox tooling that simulates the gateway.
    pub fn signed(
        secret: &str,
        reference: &str,
        gateway_txn_id: &str,
        status: GatewayStatus,
        amount_minor: i64,
    ) -> Self {
        let mut payload = Self {
            reference: reference.to_string(),
            gateway_txn_id: gateway_txn_id.to_string(),
            status,
            amount_minor,
            signature: String::new(),
        };
        payload.signature = signature::sign(secret, &payload.canonical_string());
        payload
    }
}
