//! Signed redirect parameters for the gateway pay page.
//!
//! Intent creation returns these to the client, which posts them as a form
//! to `pay_url`. The gateway recomputes the signature before showing its
//! payment page, so the amount and reference cannot be edited in transit.

use serde::Serialize;
use utoipa::ToSchema;

use crate::config::GatewayConfig;
use crate::signature;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedirectParams {
    pub pay_url: String,
    pub merchant_id: String,
    pub reference: String,
    pub amount_minor: i64,
    pub callback_url: String,
    pub signature: String,
}

impl RedirectParams {
    pub fn build(config: &GatewayConfig, reference: &str, amount_minor: i64) -> Self {
        let canonical = format!(
            "{}|{}|{}|{}",
            amount_minor, config.callback_url, config.merchant_id, reference
        );
        Self {
            pay_url: config.pay_url.clone(),
            merchant_id: config.merchant_id.clone(),
            reference: reference.to_string(),
            amount_minor,
            callback_url: config.callback_url.clone(),
            signature: signature::sign(&config.secret, &canonical),
        }
    }
}
