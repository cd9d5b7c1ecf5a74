use crate::modules::student_fees::controller::{
    add_concession, add_fine, assign_student_fee, get_balance, get_fee_payments, get_student_fee,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_student_fees_router() -> Router<AppState> {
    Router::new()
        .route("/", post(assign_student_fee))
        .route("/{id}", get(get_student_fee))
        .route("/{id}/balance", get(get_balance))
        .route("/{id}/concessions", post(add_concession))
        .route("/{id}/fines", post(add_fine))
        .route("/{id}/payments", get(get_fee_payments))
}
