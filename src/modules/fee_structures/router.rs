use crate::modules::fee_structures::controller::{
    create_fee_structure, delete_fee_structure, get_fee_structure, get_fee_structures,
    update_fee_structure,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_fee_structures_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_fee_structure).get(get_fee_structures))
        .route(
            "/{id}",
            get(get_fee_structure)
                .put(update_fee_structure)
                .delete(delete_fee_structure),
        )
}
