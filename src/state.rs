use bursar_db::PgPool;
use bursar_gateway::GatewayConfig;

use crate::config::cors::CorsConfig;
use crate::config::email::EmailConfig;
use crate::config::jwt::JwtConfig;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub gateway_config: GatewayConfig,
}

pub async fn init_app_state() -> AppState {
    AppState {
        db: bursar_db::init_db_pool().await,
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        gateway_config: GatewayConfig::from_env(),
    }
}
