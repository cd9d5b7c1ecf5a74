use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{Claims, ROLE_STAFF, verify_token};

/// Extractor that validates the bearer token and yields the caller's claims.
///
/// Identity (login, password, roles) is owned by the campus identity
/// service; this API only verifies the tokens it issues.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Whether the caller is bursar-office staff.
    pub fn is_staff(&self) -> bool {
        self.0.role == ROLE_STAFF
    }

    /// Get the user ID as UUID
    pub fn user_id(&self) -> Result<uuid::Uuid, AppError> {
        uuid::Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }

    /// Get the user's email
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A previous middleware layer may already have authenticated us.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}
