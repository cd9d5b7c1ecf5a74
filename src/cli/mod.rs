//! Maintenance commands invoked as `bursar <command>` from cron or an
//! operator shell, sharing the service layer with the HTTP server.

use sqlx::PgPool;

use crate::modules::payments::service::IntentService;

/// Fail PENDING intents whose callback window has passed and flip past-due
/// installments to overdue. Returns (expired intents, overdue installments).
pub async fn run_expiry_sweep(
    db: &PgPool,
    older_than_minutes: i32,
) -> anyhow::Result<(u64, u64)> {
    IntentService::expire_stale(db, older_than_minutes)
        .await
        .map_err(|e| e.error)
}
