use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use bursar::config::cors::CorsConfig;
use bursar::config::email::EmailConfig;
use bursar::config::jwt::JwtConfig;
use bursar::router::init_router;
use bursar::state::AppState;
use bursar::utils::jwt::{ROLE_STAFF, ROLE_STUDENT, create_access_token};
use bursar_gateway::GatewayConfig;

/// Shared secret the test app and the simulated gateway both use.
pub const TEST_GATEWAY_SECRET: &str = "integration-test-gateway-secret";

pub fn test_gateway_config() -> GatewayConfig {
    GatewayConfig {
        merchant_id: "MERCH-TEST".to_string(),
        secret: TEST_GATEWAY_SECRET.to_string(),
        pay_url: "https://sandbox.gateway.example.com/pay".to_string(),
        callback_url: "http://localhost:3000/api/payments/callback".to_string(),
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        gateway_config: test_gateway_config(),
    };
    init_router(state)
}

#[allow(dead_code)]
pub fn staff_token() -> String {
    create_access_token(
        Uuid::new_v4(),
        "clerk@example.edu",
        ROLE_STAFF,
        &JwtConfig::from_env(),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn student_token() -> String {
    create_access_token(
        Uuid::new_v4(),
        "student@example.edu",
        ROLE_STUDENT,
        &JwtConfig::from_env(),
    )
    .unwrap()
}

/// A student fee seeded straight into the database.
#[allow(dead_code)]
pub struct SeededFee {
    pub student_fee_id: Uuid,
    pub fee_structure_id: Uuid,
    pub student_id: Uuid,
    pub total_minor: i64,
}

/// Insert a fee structure, a student fee and an installment schedule.
/// `installments` pairs are (due date "YYYY-MM-DD", amount in minor units).
pub async fn seed_fee(pool: &PgPool, installments: &[(&str, i64)]) -> SeededFee {
    let total_minor: i64 = installments.iter().map(|(_, amount)| amount).sum();
    let student_id = Uuid::new_v4();

    let fee_structure_id: Uuid = sqlx::query_scalar(
        "INSERT INTO fee_structures (name, program, academic_year)
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("Structure {}", Uuid::new_v4()))
    .bind("B.Tech CSE")
    .bind("2025-26")
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO fee_components (fee_structure_id, label, amount_minor) VALUES ($1, $2, $3)",
    )
    .bind(fee_structure_id)
    .bind("Tuition")
    .bind(total_minor)
    .execute(pool)
    .await
    .unwrap();

    let student_fee_id: Uuid = sqlx::query_scalar(
        "INSERT INTO student_fees (student_id, fee_structure_id, total_minor)
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(student_id)
    .bind(fee_structure_id)
    .bind(total_minor)
    .fetch_one(pool)
    .await
    .unwrap();

    for (due_date, amount_minor) in installments {
        sqlx::query(
            "INSERT INTO student_fee_installments (student_fee_id, due_date, amount_minor)
             VALUES ($1, $2::DATE, $3)",
        )
        .bind(student_fee_id)
        .bind(due_date)
        .bind(amount_minor)
        .execute(pool)
        .await
        .unwrap();
    }

    SeededFee {
        student_fee_id,
        fee_structure_id,
        student_id,
        total_minor,
    }
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[allow(dead_code)]
pub async fn get_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
