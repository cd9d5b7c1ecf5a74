use crate::modules::payments::controller::{create_intent, gateway_callback, get_intent};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_payments_router() -> Router<AppState> {
    Router::new()
        .route("/intents", post(create_intent))
        .route("/intents/{reference}", get(get_intent))
        .route("/callback", post(gateway_callback))
}
