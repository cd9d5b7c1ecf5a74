mod common;

use common::{
    TEST_GATEWAY_SECRET, get_json, post_json, seed_fee, setup_test_app, staff_token, student_token,
};
use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use bursar::modules::payments::service::IntentService;
use bursar_gateway::{CallbackPayload, GatewayStatus};

async fn confirm_payment(app: axum::Router, reference: &str, amount_minor: i64) {
    let payload = CallbackPayload::signed(
        TEST_GATEWAY_SECRET,
        reference,
        "GW-TXN-L",
        GatewayStatus::Success,
        amount_minor,
    );
    let (status, _) = post_json(
        app,
        "/api/payments/callback",
        None,
        serde_json::to_value(payload).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn balance_reflects_concessions_fines_and_payments(pool: PgPool) {
    let fee = seed_fee(&pool, &[("2025-01-01", 60_000), ("2025-02-01", 40_000)]).await;
    let app = setup_test_app(pool.clone());
    let staff = staff_token();
    let student = student_token();

    // Concession of 10_000 and a fine of 5_000.
    let (status, _) = post_json(
        app.clone(),
        &format!("/api/student-fees/{}/concessions", fee.student_fee_id),
        Some(&staff),
        json!({"amount_minor": 10_000, "reason": "merit scholarship"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post_json(
        app.clone(),
        &format!("/api/student-fees/{}/fines", fee.student_fee_id),
        Some(&staff),
        json!({"amount_minor": 5_000, "reason": "late registration"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // installments 100_000 − concession 10_000 + fines 5_000 = 95_000
    let (_, balance) = get_json(
        app.clone(),
        &format!("/api/student-fees/{}/balance", fee.student_fee_id),
        Some(&student),
    )
    .await;
    assert_eq!(balance["installments_due_minor"], 100_000);
    assert_eq!(balance["concession_minor"], 10_000);
    assert_eq!(balance["fines_due_minor"], 5_000);
    assert_eq!(balance["outstanding_minor"], 95_000);

    // Confirm a payment of 70_000; outstanding drops to 25_000.
    let (_, created) = post_json(
        app.clone(),
        "/api/payments/intents",
        Some(&student),
        json!({"student_fee_id": fee.student_fee_id, "amount_minor": 70_000}),
    )
    .await;
    let reference = created["reference"].as_str().unwrap().to_string();
    confirm_payment(app.clone(), &reference, 70_000).await;

    let (_, balance) = get_json(
        app.clone(),
        &format!("/api/student-fees/{}/balance", fee.student_fee_id),
        Some(&student),
    )
    .await;
    assert_eq!(balance["installments_due_minor"], 30_000);
    assert_eq!(balance["outstanding_minor"], 25_000);

    // Paying the rest exhausts installments and the fine; the concession
    // floors the installment side, never below zero overall.
    let (_, created) = post_json(
        app.clone(),
        "/api/payments/intents",
        Some(&student),
        json!({"student_fee_id": fee.student_fee_id, "amount_minor": 25_000}),
    )
    .await;
    let reference = created["reference"].as_str().unwrap().to_string();
    let payload = CallbackPayload::signed(
        TEST_GATEWAY_SECRET,
        &reference,
        "GW-TXN-L2",
        GatewayStatus::Success,
        25_000,
    );
    let (status, _) = post_json(
        app.clone(),
        "/api/payments/callback",
        None,
        serde_json::to_value(payload).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, balance) = get_json(
        app,
        &format!("/api/student-fees/{}/balance", fee.student_fee_id),
        Some(&student),
    )
    .await;
    assert_eq!(balance["outstanding_minor"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn concession_cannot_exceed_outstanding(pool: PgPool) {
    let fee = seed_fee(&pool, &[("2025-01-01", 20_000)]).await;
    let app = setup_test_app(pool);
    let staff = staff_token();

    let (status, body) = post_json(
        app,
        &format!("/api/student-fees/{}/concessions", fee.student_fee_id),
        Some(&staff),
        json!({"amount_minor": 25_000, "reason": "overgenerous"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exceeds"));
}

#[sqlx::test(migrations = "./migrations")]
async fn concessions_and_fines_require_staff(pool: PgPool) {
    let fee = seed_fee(&pool, &[("2025-01-01", 20_000)]).await;
    let app = setup_test_app(pool);
    let student = student_token();

    let (status, _) = post_json(
        app.clone(),
        &format!("/api/student-fees/{}/concessions", fee.student_fee_id),
        Some(&student),
        json!({"amount_minor": 1_000, "reason": "self-service discount"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post_json(
        app,
        &format!("/api/student-fees/{}/fines", fee.student_fee_id),
        Some(&student),
        json!({"amount_minor": 1_000, "reason": "should not work"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn assignment_schedule_must_match_structure_total(pool: PgPool) {
    let app = setup_test_app(pool);
    let staff = staff_token();

    let (status, structure) = post_json(
        app.clone(),
        "/api/fee-structures",
        Some(&staff),
        json!({
            "name": "B.Tech Year 1",
            "program": "B.Tech CSE",
            "academic_year": "2025-26",
            "components": [
                {"label": "Tuition", "amount_minor": 80_000},
                {"label": "Lab", "amount_minor": 20_000}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(structure["total_minor"], 100_000);
    let structure_id = structure["id"].as_str().unwrap();

    // Short by 10_000.
    let (status, body) = post_json(
        app.clone(),
        "/api/student-fees",
        Some(&staff),
        json!({
            "student_id": uuid::Uuid::new_v4(),
            "fee_structure_id": structure_id,
            "installments": [
                {"due_date": "2025-01-01", "amount_minor": 50_000},
                {"due_date": "2025-02-01", "amount_minor": 40_000}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("totals"));

    let (status, fee) = post_json(
        app,
        "/api/student-fees",
        Some(&staff),
        json!({
            "student_id": uuid::Uuid::new_v4(),
            "fee_structure_id": structure_id,
            "installments": [
                {"due_date": "2025-01-01", "amount_minor": 50_000},
                {"due_date": "2025-02-01", "amount_minor": 50_000}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fee["total_minor"], 100_000);
    assert_eq!(fee["installments"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn assigned_structures_are_immutable(pool: PgPool) {
    let fee = seed_fee(&pool, &[("2025-01-01", 50_000)]).await;
    let app = setup_test_app(pool);
    let staff = staff_token();

    let uri = format!("/api/fee-structures/{}", fee.fee_structure_id);

    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header("authorization", format!("Bearer {}", staff))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let request = axum::http::Request::builder()
        .method("PUT")
        .uri(&uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", staff))
        .body(axum::body::Body::from(
            serde_json::to_string(&json!({"name": "Renamed"})).unwrap(),
        ))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn fee_structure_routes_require_staff(pool: PgPool) {
    let app = setup_test_app(pool);
    let student = student_token();

    let (status, _) = post_json(
        app,
        "/api/fee-structures",
        Some(&student),
        json!({
            "name": "Sneaky",
            "program": "B.Tech CSE",
            "academic_year": "2025-26",
            "components": [{"label": "Tuition", "amount_minor": 1_000}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn payments_listing_shows_confirmed_credits(pool: PgPool) {
    let fee = seed_fee(&pool, &[("2025-01-01", 50_000)]).await;
    let app = setup_test_app(pool.clone());
    let student = student_token();

    let (_, created) = post_json(
        app.clone(),
        "/api/payments/intents",
        Some(&student),
        json!({"student_fee_id": fee.student_fee_id, "amount_minor": 50_000}),
    )
    .await;
    let reference = created["reference"].as_str().unwrap().to_string();
    confirm_payment(app.clone(), &reference, 50_000).await;

    let (status, payments) = get_json(
        app,
        &format!("/api/student-fees/{}/payments", fee.student_fee_id),
        Some(&student),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payments = payments.as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["amount_minor"], 50_000);
    assert_eq!(payments[0]["gateway_txn_id"], "GW-TXN-L");
}

#[sqlx::test(migrations = "./migrations")]
async fn expiry_sweep_fails_stale_intents_and_marks_overdue(pool: PgPool) {
    // An installment already past due and an intent created an hour ago.
    let fee = seed_fee(&pool, &[("2020-01-01", 50_000)]).await;
    let app = setup_test_app(pool.clone());
    let student = student_token();

    let (_, created) = post_json(
        app,
        "/api/payments/intents",
        Some(&student),
        json!({"student_fee_id": fee.student_fee_id, "amount_minor": 50_000}),
    )
    .await;
    let reference = created["reference"].as_str().unwrap().to_string();

    sqlx::query(
        "UPDATE payment_intents SET created_at = now() - interval '1 hour' WHERE reference = $1",
    )
    .bind(&reference)
    .execute(&pool)
    .await
    .unwrap();

    let (expired, overdue) = IntentService::expire_stale(&pool, 30).await.unwrap();
    assert_eq!(expired, 1);
    assert_eq!(overdue, 1);

    let (state, reason): (String, String) = sqlx::query_as(
        "SELECT state::TEXT, failure_reason FROM payment_intents WHERE reference = $1",
    )
    .bind(&reference)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(state, "failed");
    assert_eq!(reason, "expired");

    // A second sweep finds nothing new.
    let (expired, overdue) = IntentService::expire_stale(&pool, 30).await.unwrap();
    assert_eq!(expired, 0);
    assert_eq!(overdue, 0);
}
