//! Payment models and DTOs.
//!
//! Entities and request DTOs come from the shared models crate; the gateway
//! payload and redirect types from `bursar-gateway`. Types below exist only
//! for this module's responses.

pub use bursar_gateway::{CallbackPayload, GatewayStatus, RedirectParams};
pub use bursar_models::payments::{
    CallbackAck, CreateIntentDto, FeePayment, IntentState, PaymentIntent, new_reference,
};

use serde::Serialize;
use utoipa::ToSchema;

/// Response to intent creation: the reference to poll plus the signed form
/// parameters the client posts to the gateway pay page.
#[derive(Debug, Serialize, ToSchema)]
pub struct IntentCreatedResponse {
    pub reference: String,
    pub state: IntentState,
    pub amount_minor: i64,
    pub redirect: RedirectParams,
}

/// What a processed callback produced, beyond the wire acknowledgment.
#[derive(Debug)]
pub struct CallbackOutcome {
    pub ack: CallbackAck,
    /// Present when a payment was confirmed and the payer left an email.
    pub receipt: Option<PaymentReceipt>,
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub email: String,
    pub reference: String,
    pub amount_minor: i64,
    pub gateway_txn_id: String,
}
