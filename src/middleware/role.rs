use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Route layer that only lets bursar-office staff through.
///
/// The authenticated user is stored in request extensions so handlers can
/// extract `AuthUser` without re-verifying the token.
pub async fn require_staff(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if !auth_user.is_staff() {
        return Err(AppError::forbidden(
            "Only bursar staff may perform this operation".to_string(),
        ));
    }

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}
