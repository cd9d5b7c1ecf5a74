use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use bursar_models::ids::StudentFeeId;
use bursar_models::money::floor_zero;
use bursar_models::payments::FeePayment;

use crate::modules::student_fees::model::{
    AssignStudentFeeDto, BalanceResponse, CreateConcessionDto, CreateFineDto, FeeConcession,
    FeeFine, StudentFee, StudentFeeInstallment, StudentFeeResponse,
};
use crate::utils::errors::AppError;

const FEE_COLS: &str = "id, student_id, fee_structure_id, total_minor, created_at, updated_at";
const INSTALLMENT_COLS: &str =
    "id, student_fee_id, due_date, amount_minor, paid_minor, status, created_at, updated_at";
const CONCESSION_COLS: &str = "id, student_fee_id, amount_minor, reason, approved_by, created_at";
const FINE_COLS: &str =
    "id, student_fee_id, amount_minor, paid_minor, reason, status, imposed_by, created_at";

pub struct StudentFeeService;

impl StudentFeeService {
    /// Instantiate a fee structure for a student with an explicit
    /// installment schedule. The schedule must sum to the structure total.
    #[instrument(skip(db, dto))]
    pub async fn assign_fee(
        db: &PgPool,
        dto: AssignStudentFeeDto,
    ) -> Result<StudentFeeResponse, AppError> {
        let mut tx = db.begin().await?;

        let structure_total: Option<i64> = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_minor), 0)::BIGINT
             FROM fee_components WHERE fee_structure_id = $1
             GROUP BY fee_structure_id",
        )
        .bind(dto.fee_structure_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to total fee structure")
        .map_err(AppError::database)?;

        let Some(total_minor) = structure_total else {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Fee structure not found"
            )));
        };

        let schedule_total = dto.schedule_total_minor();
        if schedule_total != total_minor {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "Installment schedule totals {} but the fee structure totals {}",
                schedule_total,
                total_minor
            )));
        }

        let fee = sqlx::query_as::<_, StudentFee>(&format!(
            "INSERT INTO student_fees (student_id, fee_structure_id, total_minor)
             VALUES ($1, $2, $3)
             RETURNING {FEE_COLS}"
        ))
        .bind(dto.student_id)
        .bind(dto.fee_structure_id)
        .bind(total_minor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow::anyhow!(
                        "Student already has this fee structure assigned"
                    ));
                }
            }
            AppError::database(e)
        })?;

        let mut installments = Vec::with_capacity(dto.installments.len());
        for installment in &dto.installments {
            let row = sqlx::query_as::<_, StudentFeeInstallment>(&format!(
                "INSERT INTO student_fee_installments (student_fee_id, due_date, amount_minor)
                 VALUES ($1, $2, $3)
                 RETURNING {INSTALLMENT_COLS}"
            ))
            .bind(fee.id)
            .bind(installment.due_date)
            .bind(installment.amount_minor)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert installment")
            .map_err(AppError::database)?;
            installments.push(row);
        }

        tx.commit().await?;

        info!(
            student_fee_id = %fee.id,
            student_id = %fee.student_id,
            total_minor = fee.total_minor,
            installments = installments.len(),
            "Student fee assigned"
        );

        Ok(StudentFeeResponse {
            fee,
            installments,
            concessions: vec![],
            fines: vec![],
        })
    }

    #[instrument(skip(db))]
    pub async fn get_fee(db: &PgPool, id: StudentFeeId) -> Result<StudentFeeResponse, AppError> {
        let fee = sqlx::query_as::<_, StudentFee>(&format!(
            "SELECT {FEE_COLS} FROM student_fees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student fee")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student fee not found")))?;

        let installments = sqlx::query_as::<_, StudentFeeInstallment>(&format!(
            "SELECT {INSTALLMENT_COLS} FROM student_fee_installments
             WHERE student_fee_id = $1 ORDER BY due_date, created_at"
        ))
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch installments")
        .map_err(AppError::database)?;

        let concessions = sqlx::query_as::<_, FeeConcession>(&format!(
            "SELECT {CONCESSION_COLS} FROM fee_concessions
             WHERE student_fee_id = $1 ORDER BY created_at"
        ))
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch concessions")
        .map_err(AppError::database)?;

        let fines = sqlx::query_as::<_, FeeFine>(&format!(
            "SELECT {FINE_COLS} FROM fee_fines
             WHERE student_fee_id = $1 ORDER BY created_at"
        ))
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch fines")
        .map_err(AppError::database)?;

        Ok(StudentFeeResponse {
            fee,
            installments,
            concessions,
            fines,
        })
    }

    /// Committed-state outstanding balance for a student fee.
    #[instrument(skip(db))]
    pub async fn balance(db: &PgPool, id: StudentFeeId) -> Result<BalanceResponse, AppError> {
        let mut conn = db.acquire().await?;
        Self::balance_with(&mut conn, id).await
    }

    /// Balance computation against an explicit connection, so intent
    /// creation can run it inside its own transaction.
    ///
    /// outstanding = installment remainders − concessions + unpaid fine
    /// remainders, floored at zero. Confirmed payments are already folded
    /// into `paid_minor`, so the figure matches
    /// Σ installments − Σ payments − Σ concessions + Σ unpaid fines.
    pub(crate) async fn balance_with(
        conn: &mut PgConnection,
        id: StudentFeeId,
    ) -> Result<BalanceResponse, AppError> {
        let exists: Option<StudentFeeId> =
            sqlx::query_scalar("SELECT id FROM student_fees WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
                .context("Failed to check student fee")
                .map_err(AppError::database)?;

        if exists.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Student fee not found")));
        }

        let installments_due_minor: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_minor - paid_minor), 0)::BIGINT
             FROM student_fee_installments WHERE student_fee_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to sum installments")
        .map_err(AppError::database)?;

        let concession_minor: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_minor), 0)::BIGINT
             FROM fee_concessions WHERE student_fee_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to sum concessions")
        .map_err(AppError::database)?;

        let fines_due_minor: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_minor - paid_minor), 0)::BIGINT
             FROM fee_fines WHERE student_fee_id = $1 AND status <> 'waived'",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to sum fines")
        .map_err(AppError::database)?;

        Ok(BalanceResponse {
            student_fee_id: id,
            installments_due_minor,
            concession_minor,
            fines_due_minor,
            outstanding_minor: floor_zero(installments_due_minor - concession_minor + fines_due_minor),
        })
    }

    /// Record an approved concession. Capped at the current outstanding
    /// balance so the ledger never goes negative by adjustment.
    #[instrument(skip(db, dto))]
    pub async fn add_concession(
        db: &PgPool,
        id: StudentFeeId,
        dto: CreateConcessionDto,
        approved_by: Uuid,
    ) -> Result<FeeConcession, AppError> {
        let mut tx = db.begin().await?;

        // Serialize with payment application for the same fee.
        let locked: Option<StudentFeeId> =
            sqlx::query_scalar("SELECT id FROM student_fees WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock student fee")
                .map_err(AppError::database)?;

        if locked.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Student fee not found")));
        }

        let balance = Self::balance_with(&mut *tx, id).await?;
        if dto.amount_minor > balance.outstanding_minor {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Concession {} exceeds outstanding balance {}",
                dto.amount_minor,
                balance.outstanding_minor
            )));
        }

        let concession = sqlx::query_as::<_, FeeConcession>(&format!(
            "INSERT INTO fee_concessions (student_fee_id, amount_minor, reason, approved_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {CONCESSION_COLS}"
        ))
        .bind(id)
        .bind(dto.amount_minor)
        .bind(&dto.reason)
        .bind(approved_by)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert concession")
        .map_err(AppError::database)?;

        tx.commit().await?;

        info!(
            student_fee_id = %id,
            concession_id = %concession.id,
            amount_minor = concession.amount_minor,
            approved_by = %approved_by,
            "Concession recorded"
        );

        Ok(concession)
    }

    #[instrument(skip(db, dto))]
    pub async fn add_fine(
        db: &PgPool,
        id: StudentFeeId,
        dto: CreateFineDto,
        imposed_by: Uuid,
    ) -> Result<FeeFine, AppError> {
        let exists: Option<StudentFeeId> =
            sqlx::query_scalar("SELECT id FROM student_fees WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to check student fee")
                .map_err(AppError::database)?;

        if exists.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Student fee not found")));
        }

        let fine = sqlx::query_as::<_, FeeFine>(&format!(
            "INSERT INTO fee_fines (student_fee_id, amount_minor, reason, imposed_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {FINE_COLS}"
        ))
        .bind(id)
        .bind(dto.amount_minor)
        .bind(&dto.reason)
        .bind(imposed_by)
        .fetch_one(db)
        .await
        .context("Failed to insert fine")
        .map_err(AppError::database)?;

        info!(
            student_fee_id = %id,
            fine_id = %fine.id,
            amount_minor = fine.amount_minor,
            imposed_by = %imposed_by,
            "Fine recorded"
        );

        Ok(fine)
    }

    /// Confirmed payments credited against this fee, newest first.
    #[instrument(skip(db))]
    pub async fn list_payments(
        db: &PgPool,
        id: StudentFeeId,
    ) -> Result<Vec<FeePayment>, AppError> {
        let exists: Option<StudentFeeId> =
            sqlx::query_scalar("SELECT id FROM student_fees WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to check student fee")
                .map_err(AppError::database)?;

        if exists.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Student fee not found")));
        }

        sqlx::query_as::<_, FeePayment>(
            "SELECT id, intent_id, student_fee_id, amount_minor, gateway_txn_id, created_at
             FROM fee_payments WHERE student_fee_id = $1
             ORDER BY created_at DESC",
        )
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to list payments")
        .map_err(AppError::database)
    }
}
