use std::env;

/// Gateway merchant credentials and endpoints.
///
/// The shared secret signs outbound redirect parameters and verifies inbound
/// callbacks; it must match the value configured on the gateway's merchant
/// dashboard.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub merchant_id: String,
    pub secret: String,
    /// Gateway pay-page URL the client posts the signed form to.
    pub pay_url: String,
    /// Our callback endpoint, registered with the gateway.
    pub callback_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            merchant_id: env::var("GATEWAY_MERCHANT_ID").unwrap_or_else(|_| "MERCH001".to_string()),
            secret: env::var("GATEWAY_SECRET")
                .unwrap_or_else(|_| "dev-gateway-secret-change-in-production".to_string()),
            pay_url: env::var("GATEWAY_PAY_URL")
                .unwrap_or_else(|_| "https://sandbox.gateway.example.com/pay".to_string()),
            callback_url: env::var("GATEWAY_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api/payments/callback".to_string()),
        }
    }
}
