use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::utils::errors::AppError;

/// Role of a bursar-office staff member. Staff manage structures,
/// assignments, concessions and fines.
pub const ROLE_STAFF: &str = "staff";
/// Role of a student paying through the portal.
pub const ROLE_STUDENT: &str = "student";

/// Claims carried by access tokens issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "unit-test-secret".to_string(),
            access_token_expiry: 3600,
        }
    }

    #[test]
    fn create_and_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token =
            create_access_token(user_id, "clerk@example.edu", ROLE_STAFF, &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "clerk@example.edu");
        assert_eq!(claims.role, ROLE_STAFF);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token =
            create_access_token(Uuid::new_v4(), "clerk@example.edu", ROLE_STAFF, &config())
                .unwrap();
        let other = JwtConfig {
            secret: "a-different-secret".to_string(),
            access_token_expiry: 3600,
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(verify_token("definitely.not.a-token", &config()).is_err());
    }
}
